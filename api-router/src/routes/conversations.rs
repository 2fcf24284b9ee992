use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use common::storage::types::conversation::Conversation;

use crate::{api_state::ApiState, error::ApiError};

/// Inbox listing: one row per session, newest activity first.
pub async fn list_conversations(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = Conversation::list_summaries(&state.db).await?;

    Ok(Json(summaries))
}

/// Full transcript for one session, oldest turn first. Unknown sessions
/// read as an empty transcript rather than an error.
pub async fn get_conversation(
    Path(session_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = Conversation::get_messages(&session_id, &state.db).await;

    Ok(Json(messages))
}
