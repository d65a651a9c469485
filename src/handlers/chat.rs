use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::{MessageResponse, SendMessageRequest, SendMessageResponse};
use crate::error::AppResult;
use crate::models::chat::ChatMessage;
use crate::AppState;

pub async fn get_transcript(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.chat.messages().await)
}

/// Talks to the philosopher currently selected in preferences.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    body.validate()?;
    let philosopher = state.preferences.get().await.selected_philosopher;

    let reply = state.chat.send(&body.message, &philosopher).await?;
    Ok(Json(SendMessageResponse { philosopher, reply }))
}

pub async fn clear_transcript(State(state): State<AppState>) -> Json<MessageResponse> {
    state.chat.clear().await;
    Json(MessageResponse::new("Conversation cleared"))
}
