use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::session::SESSION_COOKIE;

/// Resolve the caller's session before any protected handler runs.
///
/// The token comes from the session cookie, falling back to an
/// `Authorization: Bearer` header. On success the `Session` is placed in the
/// request extensions; on any failure the request stops here.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(ApiError::AuthenticationFailed)?;

    let session = state.sessions.validate(&token)?;

    // The signature proves who we issued it to, not that they still exist here
    let db = state.clone();
    let username = session.username.clone();
    let exists = blocking(move || Ok(db.db.account_exists(&username)?)).await?;
    if !exists {
        debug!("Session for unknown account {}", session.username);
        return Err(ApiError::AuthenticationFailed);
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
