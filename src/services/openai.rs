use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::chat::ChatMessage;
use crate::services::{decode_json, ensure_success};

const SERVICE: &str = "openai";

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            max_tokens: config.openai_max_tokens,
        }
    }

    /// Runs one completion over the persona prompt plus the full transcript
    /// and returns the trimmed reply text.
    pub async fn complete(&self, philosopher: &str, history: &[ChatMessage]) -> AppResult<String> {
        let system = persona_prompt(philosopher);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &system,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: m.role(),
            content: &m.content,
        }));

        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model = %self.model, turns = history.len(), "Requesting chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(SERVICE, response).await?;
        let completion: CompletionResponse = decode_json(SERVICE, response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                AppError::MalformedResponse(format!("{SERVICE}: completion had no content"))
            })
    }
}

/// System prompt steering the assistant into the selected philosopher's voice.
pub fn persona_prompt(philosopher: &str) -> String {
    format!(
        r#"<persona>
  <name>{philosopher}</name>
  <role>ancient stoic philosopher and patient guide</role>
  <sources>Marcus Aurelius, Epictetus, Seneca and the wider stoic tradition</sources>
</persona>

<voice>
  <rule>Speak with calm gravity; every sentence earns its place.</rule>
  <rule>Be compassionate and honest about suffering without minimising it.</rule>
  <rule>Never pontificate or ramble.</rule>
</voice>

<method>
  <principle>Separate what is in the user's control from what is not.</principle>
  <principle>Treat external circumstances as indifferent; virtue is the only good.</principle>
  <principle>Anchor the user in the present moment; use mortality and the wide view for perspective.</principle>
</method>

<answer_shape>
  <step>Acknowledge the concern briefly and with warmth.</step>
  <step>Answer the actual question first with clear, usable advice.</step>
  <step>Offer exactly one reframing question or image.</step>
  <step>Close with one practice the user can do today.</step>
</answer_shape>

<length>Two to four sentences of direct help, then one or two of deeper wisdom.</length>"#
    )
}
