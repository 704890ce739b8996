use axum::{Extension, Json, extract::State, response::IntoResponse};

use parlor_types::api::ConversationSummaryResponse;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::session::Session;

/// The caller's correspondents, most recently active first.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries =
        blocking(move || Ok(state.db.conversation_summaries(&session.username)?)).await?;

    let chats: Vec<ConversationSummaryResponse> = summaries
        .into_iter()
        .map(ConversationSummaryResponse::from)
        .collect();
    Ok(Json(chats))
}
