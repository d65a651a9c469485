pub mod insights;
pub mod openai;
pub mod quotes;
pub mod supabase;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Shared client for every remote service. No retries; one timeout for all.
pub fn http_client(config: &Config) -> AppResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("stoa-journal/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Turns a non-2xx response into `AppError::Upstream`, passing 2xx through.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream {
        service,
        status: status.as_u16(),
        message: upstream_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
    })
}

/// Like `ensure_success`, but only `expected` passes; any other 2xx is an
/// `Upstream` error too.
pub(crate) async fn expect_status(
    service: &'static str,
    response: Response,
    expected: StatusCode,
) -> AppResult<Response> {
    let response = ensure_success(service, response).await?;
    let status = response.status();
    if status != expected {
        return Err(AppError::Upstream {
            service,
            status: status.as_u16(),
            message: format!("expected status {}, got {}", expected.as_u16(), status.as_u16()),
        });
    }
    Ok(response)
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> AppResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| AppError::MalformedResponse(format!("{service}: {e}")))
}

/// Pulls a human-readable message out of the error bodies the remote
/// services send back.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let trimmed = body.trim();
            return (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect());
        }
    };

    let candidates = [
        &value["error"]["message"],
        &value["error_description"],
        &value["msg"],
        &value["message"],
        &value["error"],
    ];
    let message = candidates.into_iter().find_map(|v| v.as_str()).map(str::to_string);
    message
}
