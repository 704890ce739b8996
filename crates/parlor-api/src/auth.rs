use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{debug, info};

use parlor_db::Database;
use parlor_types::api::{AccountResponse, LoginRequest, RegisterRequest};

use crate::blocking;
use crate::credentials::CredentialManager;
use crate::error::ApiError;
use crate::session::SessionManager;

/// Matches the width of the original account table.
const MAX_USERNAME_LEN: usize = 100;

pub type AppState = Arc<AppStateInner>;

/// Everything a request needs. Built once at startup and never mutated.
pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionManager,
    pub credentials: CredentialManager,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty"));
    }
    if req.password != req.password2 {
        return Err(ApiError::BadRequest("passwords do not match"));
    }

    let db = state.clone();
    let username = req.username.clone();
    blocking(move || {
        let password_hash = db.credentials.hash(&req.password)?;
        db.db.create_account(&req.username, &password_hash)?;
        Ok(())
    })
    .await?;

    info!("Registered account {}", username);
    Ok((StatusCode::CREATED, Json(AccountResponse { username })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let account = blocking(move || {
        let account = db.db.get_account(&req.username)?;
        let verified = match &account {
            Some(acc) => db.credentials.verify(&acc.password_hash, &req.password),
            None => db.credentials.verify_absent(&req.password),
        };
        Ok(account.filter(|_| verified))
    })
    .await?;

    let Some(account) = account else {
        debug!("Login rejected");
        return Err(ApiError::AuthenticationFailed);
    };

    let token = state.sessions.issue(&account.username)?;
    info!("{} logged in", account.username);

    Ok((
        [(header::SET_COOKIE, state.sessions.login_cookie(&token))],
        Json(AccountResponse {
            username: account.username,
        }),
    ))
}

/// Overwrite the session cookie with an expired one. Tokens are stateless, so
/// a copy taken before logout keeps working until it expires.
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, SessionManager::logout_cookie())],
    )
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest("username must be 1-100 characters"));
    }
    if username.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
        return Err(ApiError::BadRequest("username contains invalid characters"));
    }
    Ok(())
}
