use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::debug;

use parlor_types::api::{MessageResponse, SendMessageRequest};
use parlor_types::models::Message;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::session::Session;

pub async fn send_message(
    State(state): State<AppState>,
    Path(to): Path<String>,
    Extension(session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty"));
    }

    let message = blocking(move || {
        if !state.db.account_exists(&to)? {
            return Err(ApiError::NotFound(format!("recipient {}", to)));
        }

        let mut message = Message {
            from: session.username,
            to,
            body: req.message,
            sent_at: Utc::now(),
        };
        // The store may move sent_at forward to keep it increasing
        message.sent_at = state.db.append_message(
            &message.from,
            &message.to,
            &message.body,
            message.sent_at,
        )?;
        Ok(message)
    })
    .await?;

    debug!("{} -> {} message stored", message.from, message.to);
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Full thread between the caller and `peer`, oldest first. An empty thread
/// is a 404.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(peer): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let thread = blocking(move || Ok(state.db.get_thread(&session.username, &peer)?)).await?;

    let messages: Vec<MessageResponse> = thread.into_iter().map(MessageResponse::from).collect();
    Ok(Json(messages))
}
