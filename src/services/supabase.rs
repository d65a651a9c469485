//! Client for the Supabase-style backend: GoTrue auth endpoints and the
//! PostgREST `journal_entries` collection.

use reqwest::StatusCode;
use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::journal::{JournalEntry, RemoteJournalEntry};
use crate::models::session::AuthResponse;
use crate::services::{decode_json, ensure_success, expect_status};

const SERVICE: &str = "supabase";

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let result = self
            .auth_request(&url, None, json!({ "email": email, "password": password }))
            .await;

        match result {
            Err(AppError::Upstream { status, message, .. }) if is_rejection(status) => {
                Err(AppError::Validation(message))
            }
            other => other,
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<AuthResponse> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let result = self
            .auth_request(
                &url,
                Some("password"),
                json!({ "email": email, "password": password }),
            )
            .await;

        match result {
            Err(AppError::Upstream { status, .. }) if is_rejection(status) => {
                Err(AppError::InvalidCredentials)
            }
            other => other,
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let result = self
            .auth_request(
                &url,
                Some("refresh_token"),
                json!({ "refresh_token": refresh_token }),
            )
            .await;

        match result {
            Err(AppError::Upstream { status, .. }) if is_rejection(status) => {
                Err(AppError::Unauthorized)
            }
            other => other,
        }
    }

    /// Revokes the refresh tokens behind `access_token` on the server.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn auth_request(
        &self,
        url: &str,
        grant_type: Option<&str>,
        body: serde_json::Value,
    ) -> AppResult<AuthResponse> {
        let mut request = self.http.post(url).header("apikey", &self.anon_key).json(&body);
        if let Some(grant_type) = grant_type {
            request = request.query(&[("grant_type", grant_type)]);
        }

        let response = ensure_success(SERVICE, request.send().await?).await?;
        decode_json(SERVICE, response).await
    }

    // ========================================================================
    // Journal entries
    // ========================================================================

    pub async fn insert_entry(
        &self,
        user_id: &str,
        access_token: &str,
        entry: &JournalEntry,
    ) -> AppResult<()> {
        let payload = [RemoteJournalEntry::for_upload(user_id, entry)];
        let response = self
            .http
            .post(self.entries_url())
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;

        expect_status(SERVICE, response, StatusCode::CREATED).await?;
        Ok(())
    }

    /// Entries for `user_id`, newest first.
    pub async fn fetch_entries(
        &self,
        user_id: &str,
        access_token: &str,
        limit: Option<u32>,
    ) -> AppResult<Vec<RemoteJournalEntry>> {
        let mut query = vec![
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .http
            .get(self.entries_url())
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;

        let response = expect_status(SERVICE, response, StatusCode::OK).await?;
        decode_json(SERVICE, response).await
    }

    fn entries_url(&self) -> String {
        format!("{}/rest/v1/journal_entries", self.base_url)
    }
}

fn is_rejection(status: u16) -> bool {
    matches!(status, 400 | 401 | 422)
}
