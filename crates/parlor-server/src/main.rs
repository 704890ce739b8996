mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use parlor_api::auth::{AppState, AppStateInner};
use parlor_api::credentials::CredentialManager;
use parlor_api::session::SessionManager;
use parlor_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parlor=debug,parlor_api=debug,parlor_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let credentials = CredentialManager::new(config.hash_params.clone())?;
    let sessions = SessionManager::new(config.jwt_secret.as_bytes(), config.session_ttl);

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions,
        credentials,
    });

    let app = parlor_api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Parlor listening on {} (sessions last {} min)",
        addr,
        config.session_ttl.num_minutes()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
