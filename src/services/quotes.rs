use crate::config::Config;
use crate::error::AppResult;
use crate::models::quote::{ApiQuote, Quote};
use crate::services::{decode_json, ensure_success};

const SERVICE: &str = "quotes";

#[derive(Clone)]
pub struct QuotesClient {
    http: reqwest::Client,
    url: String,
}

impl QuotesClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            url: config.quotes_url.clone(),
        }
    }

    pub async fn fetch(&self) -> AppResult<Vec<Quote>> {
        let response = self.http.get(&self.url).send().await?;
        let response = ensure_success(SERVICE, response).await?;
        let quotes: Vec<ApiQuote> = decode_json(SERVICE, response).await?;

        tracing::debug!(count = quotes.len(), "Fetched quotes");
        Ok(quotes.into_iter().map(Quote::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;

    fn client(server: &mockito::ServerGuard) -> QuotesClient {
        let config = Config::for_tests(&server.url(), PathBuf::from("/tmp/unused"));
        QuotesClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_fetch_maps_authors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/quotes")
            .with_status(200)
            .with_body(
                r#"[
                    {"id":"1","quote":"Sapere aude.","philosopher":{"id":"8D0D5B08-94A1-401D-AF81-25377AEE86DA"}},
                    {"id":"2","quote":"Anonymous wisdom.","year":"1800"}
                ]"#,
            )
            .create_async()
            .await;

        let quotes = client(&server).fetch().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].author, "Immanuel Kant");
        assert_eq!(quotes[1].author, "Unknown");
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/api/quotes").with_status(500).create_async().await;

        let result = client(&server).fetch().await;
        assert!(matches!(result, Err(AppError::Upstream { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_non_array_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/quotes")
            .with_status(200)
            .with_body(r#"{"quotes":[]}"#)
            .create_async()
            .await;

        let result = client(&server).fetch().await;
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }
}
