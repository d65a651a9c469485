use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::chat::ChatMessage;
use crate::services::openai::OpenAiClient;

/// In-memory conversation with the philosopher persona. Never persisted.
#[derive(Clone)]
pub struct ChatTranscript {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    client: OpenAiClient,
}

impl ChatTranscript {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            client,
        }
    }

    /// Appends the user's turn, asks the model for a reply and appends that.
    ///
    /// On failure the user's turn stays in the transcript and no reply is added.
    pub async fn send(&self, text: &str, philosopher: &str) -> AppResult<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message must not be empty".into()));
        }

        let history = {
            let mut messages = self.messages.write().await;
            messages.push(ChatMessage::user(text));
            messages.clone()
        };

        let reply = ChatMessage::assistant(self.client.complete(philosopher, &history).await?);
        self.messages.write().await.push(reply.clone());
        Ok(reply)
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}
