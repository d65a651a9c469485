use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.access_token.is_some() && self.user_id.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|expires_at| now.timestamp() >= expires_at)
            .unwrap_or(false)
    }

    /// `(user_id, access_token)` when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user_id.as_deref(), self.access_token.as_deref()) {
            (Some(user_id), Some(token)) => Some((user_id, token)),
            _ => None,
        }
    }
}

/// Token response from the identity endpoint.
///
/// Every field is optional: sign-up with email confirmation pending returns
/// the user object at the top level and no token at all.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
    pub refresh_token: Option<String>,
    pub user: Option<RemoteUser>,
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl AuthResponse {
    pub fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.id.as_deref())
            .or(self.id.as_deref())
    }

    fn user_email(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.email.as_deref())
            .or(self.email.as_deref())
    }

    /// Builds a session, requiring both a user id and an access token.
    pub fn into_session(self, is_guest: bool, now: DateTime<Utc>) -> AppResult<Session> {
        let user_id = self
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| AppError::MalformedResponse("no user id returned".into()))?;
        let email = self.user_email().map(str::to_string);
        let access_token = self.access_token.ok_or_else(|| {
            let detail = "no access token returned (email confirmation pending?)";
            AppError::MalformedResponse(detail.into())
        })?;

        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.and_then(|secs| now.timestamp().checked_add(secs)));

        Ok(Session {
            access_token: Some(access_token),
            user_id: Some(user_id),
            refresh_token: self.refresh_token,
            expires_at,
            email,
            is_guest,
        })
    }
}

/// What the UI shell sees about the session; tokens are never echoed.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub signed_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub is_guest: bool,
    pub expires_at: Option<i64>,
    pub expired: bool,
}

impl SessionStatus {
    pub fn of(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            signed_in: session.is_active(),
            user_id: session.user_id.clone(),
            email: session.email.clone(),
            is_guest: session.is_guest,
            expires_at: session.expires_at,
            expired: session.is_expired(now),
        }
    }
}
