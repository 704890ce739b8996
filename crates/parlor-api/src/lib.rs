pub mod accounts;
pub mod auth;
pub mod conversations;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod session;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;

/// Every route the server exposes. Everything outside the public group goes
/// through `require_session` first.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/account", get(accounts::me))
        .route("/accounts", get(accounts::list_accounts))
        .route("/search", post(accounts::search))
        .route("/chat/{username}", post(messages::send_message))
        .route("/messages/{username}", get(messages::get_thread))
        .route("/chats", get(conversations::list_conversations))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run store and hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
