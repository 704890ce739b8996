use axum::{Extension, Json, extract::State, response::IntoResponse};
use axum_extra::extract::WithRejection;

use parlor_types::api::{AccountResponse, SearchRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::session::Session;

pub async fn me(Extension(session): Extension<Session>) -> Json<AccountResponse> {
    Json(AccountResponse {
        username: session.username,
    })
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let names = blocking(move || Ok(state.db.list_usernames()?)).await?;
    Ok(Json(to_accounts(names)))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<SearchRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let names = blocking(move || Ok(state.db.search_usernames(&req.input)?)).await?;
    Ok(Json(to_accounts(names)))
}

fn to_accounts(names: Vec<String>) -> Vec<AccountResponse> {
    names
        .into_iter()
        .map(|username| AccountResponse { username })
        .collect()
}
