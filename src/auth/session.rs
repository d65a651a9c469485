//! The signed-in session: held in memory, mirrored to the key-value store.

use std::sync::Arc;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::session::{AuthResponse, Session};
use crate::services::supabase::SupabaseClient;
use crate::store::kv::KeyValueStore;

const ACCESS_TOKEN_KEY: &str = "access_token";
const USER_ID_KEY: &str = "user_id";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const EXPIRES_AT_KEY: &str = "expires_at";
const EMAIL_KEY: &str = "email";
const IS_GUEST_KEY: &str = "is_guest";

const SESSION_KEYS: [&str; 6] = [
    ACCESS_TOKEN_KEY,
    USER_ID_KEY,
    REFRESH_TOKEN_KEY,
    EXPIRES_AT_KEY,
    EMAIL_KEY,
    IS_GUEST_KEY,
];

const GUEST_PASSWORD_LEN: usize = 24;

#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Session>>,
    kv: KeyValueStore,
    client: SupabaseClient,
}

impl SessionStore {
    /// Restores whatever session the previous run left behind.
    pub async fn load(kv: KeyValueStore, client: SupabaseClient) -> Self {
        let session = Session {
            access_token: kv.get(ACCESS_TOKEN_KEY).await,
            user_id: kv.get(USER_ID_KEY).await,
            refresh_token: kv.get(REFRESH_TOKEN_KEY).await,
            expires_at: kv.get(EXPIRES_AT_KEY).await,
            email: kv.get(EMAIL_KEY).await,
            is_guest: kv.get(IS_GUEST_KEY).await.unwrap_or(false),
        };

        if let Some(user_id) = session.user_id.as_deref().filter(|_| session.is_active()) {
            tracing::info!(user_id = %user_id, is_guest = session.is_guest, "Restored session");
        }

        Self {
            current: Arc::new(RwLock::new(session)),
            kv,
            client,
        }
    }

    pub async fn current(&self) -> Session {
        self.current.read().await.clone()
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session> {
        let result = self.client.sign_up(email, password).await;
        self.establish(result, false).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let result = self.client.sign_in_with_password(email, password).await;
        self.establish(result, false).await
    }

    /// Signs up a throwaway account with generated credentials.
    pub async fn sign_in_as_guest(&self) -> AppResult<Session> {
        let (email, password) = guest_credentials();
        tracing::info!(email = %email, "Creating guest account");
        let result = self.client.sign_up(&email, &password).await;
        self.establish(result, true).await
    }

    /// Exchanges the stored refresh token for a fresh session.
    ///
    /// The result is only committed if the session still holds the token the
    /// exchange started with; a logout or new sign-in in the meantime wins.
    /// A rejected refresh token ends the session; transport failures leave it
    /// in place so the caller can try again.
    pub async fn refresh(&self) -> AppResult<Session> {
        let (refresh_token, is_guest) = {
            let session = self.current.read().await;
            let token = session.refresh_token.clone().ok_or(AppError::Unauthorized)?;
            (token, session.is_guest)
        };

        let result = self.client.refresh(&refresh_token).await;

        let mut current = self.current.write().await;
        if current.refresh_token.as_deref() != Some(refresh_token.as_str()) {
            tracing::debug!("Session changed while refreshing, discarding result");
            return if current.is_active() {
                Ok(current.clone())
            } else {
                Err(AppError::Unauthorized)
            };
        }

        match result {
            Err(AppError::Unauthorized) => {
                tracing::warn!("Refresh token rejected, clearing session");
                self.clear(&mut current).await;
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e),
            Ok(response) => {
                let mut session = response.into_session(is_guest, Utc::now())?;
                if session.refresh_token.is_none() {
                    session.refresh_token = Some(refresh_token);
                }
                self.replace(&mut current, session).await
            }
        }
    }

    /// Clears the local session, then revokes it remotely on a best-effort basis.
    pub async fn logout(&self) -> AppResult<()> {
        let previous = {
            let mut current = self.current.write().await;
            let previous = std::mem::take(&mut *current);
            self.kv.remove(&SESSION_KEYS).await?;
            previous
        };

        if let Some(token) = previous.access_token.as_deref() {
            if let Err(e) = self.client.logout(token).await {
                tracing::warn!(error = %e, "Remote logout failed");
            }
        }

        if let Some(user_id) = previous.user_id.as_deref() {
            tracing::info!(user_id = %user_id, "Logged out");
        }
        Ok(())
    }

    async fn establish(
        &self,
        result: AppResult<AuthResponse>,
        is_guest: bool,
    ) -> AppResult<Session> {
        let outcome = result.and_then(|response| response.into_session(is_guest, Utc::now()));

        let mut current = self.current.write().await;
        match outcome {
            Ok(session) => self.replace(&mut current, session).await,
            Err(e) => {
                self.clear(&mut current).await;
                Err(e)
            }
        }
    }

    /// Memory and disk change together while the caller holds the write lock.
    async fn replace(&self, current: &mut Session, session: Session) -> AppResult<Session> {
        self.kv
            .update(|values| {
                put(values, ACCESS_TOKEN_KEY, session.access_token.clone().map(Value::from));
                put(values, USER_ID_KEY, session.user_id.clone().map(Value::from));
                put(values, REFRESH_TOKEN_KEY, session.refresh_token.clone().map(Value::from));
                put(values, EXPIRES_AT_KEY, session.expires_at.map(Value::from));
                put(values, EMAIL_KEY, session.email.clone().map(Value::from));
                put(values, IS_GUEST_KEY, Some(Value::from(session.is_guest)));
            })
            .await?;

        *current = session.clone();
        if let Some(user_id) = session.user_id.as_deref() {
            tracing::info!(user_id = %user_id, is_guest = session.is_guest, "Session established");
        }
        Ok(session)
    }

    async fn clear(&self, current: &mut Session) {
        *current = Session::default();
        if let Err(e) = self.kv.remove(&SESSION_KEYS).await {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }
}

fn put(values: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            values.insert(key.to_string(), value);
        }
        None => {
            values.remove(key);
        }
    }
}

fn guest_credentials() -> (String, String) {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GUEST_PASSWORD_LEN)
        .map(char::from)
        .collect();
    (format!("guest+{suffix}@example.com"), password)
}
