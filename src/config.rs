use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

/// Loopback clients all share one limiter key, so the default leaves room for retries.
pub const DEFAULT_AUTH_RATE_LIMIT_MAX: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub supabase_url: String,
    pub supabase_anon_key: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,

    pub quotes_url: String,

    pub data_dir: PathBuf,
    pub http_timeout_secs: u64,

    pub auth_rate_limit_max: u32,
    pub auth_rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_var("PORT", 8787)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),

            supabase_url: trim_url(env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,

            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: trim_url(
                env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            ),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            openai_max_tokens: parse_var("OPENAI_MAX_TOKENS", 120)?,

            quotes_url: env::var("QUOTES_URL")
                .unwrap_or_else(|_| "https://philosophersapi.com/api/quotes".into()),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".stoa")),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 30)?,

            auth_rate_limit_max: parse_var("AUTH_RATE_LIMIT_MAX", DEFAULT_AUTH_RATE_LIMIT_MAX)?,
            auth_rate_limit_window_secs: parse_var("AUTH_RATE_LIMIT_WINDOW_SECS", 60)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origins allowed for CORS and for the event stream upgrade.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![trim_url(self.frontend_url.clone())];
        origins.extend(self.cors_extra_origins.iter().cloned());
        origins
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins().iter().any(|allowed| allowed == origin)
    }

    /// File backing the local key-value store (session mirror and preferences).
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
impl Config {
    /// Points every remote endpoint at a single mock server.
    pub fn for_tests(upstream: &str, data_dir: PathBuf) -> Self {
        let upstream = trim_url(upstream.to_string());
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            supabase_url: upstream.clone(),
            supabase_anon_key: "anon-key".into(),
            openai_api_key: "sk-test".into(),
            openai_base_url: format!("{upstream}/v1"),
            openai_model: "gpt-3.5-turbo".into(),
            openai_max_tokens: 120,
            quotes_url: format!("{upstream}/api/quotes"),
            data_dir,
            http_timeout_secs: 5,
            auth_rate_limit_max: DEFAULT_AUTH_RATE_LIMIT_MAX,
            auth_rate_limit_window_secs: 60,
        }
    }
}
