use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use auth::{rate_limit::RateLimitState, session::SessionStore};
use config::Config;
use services::{openai::OpenAiClient, quotes::QuotesClient, supabase::SupabaseClient};
use store::{
    chat::ChatTranscript, journal::JournalStore, kv::KeyValueStore, preferences::PreferencesStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionStore,
    pub journal: JournalStore,
    pub chat: ChatTranscript,
    pub preferences: PreferencesStore,
    pub supabase: SupabaseClient,
    pub quotes: QuotesClient,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub async fn build(config: Arc<Config>) -> anyhow::Result<Self> {
        let http = services::http_client(&config)?;
        let kv = KeyValueStore::open(config.store_path())
            .await
            .with_context(|| format!("failed to open {}", config.store_path().display()))?;

        let supabase = SupabaseClient::new(http.clone(), &config);
        let session = SessionStore::load(kv.clone(), supabase.clone()).await;
        let chat = ChatTranscript::new(OpenAiClient::new(http.clone(), &config));
        let quotes = QuotesClient::new(http, &config);
        let rate_limiter = RateLimitState::new(
            config.auth_rate_limit_max,
            Duration::from_secs(config.auth_rate_limit_window_secs),
        );

        Ok(Self {
            config,
            session,
            journal: JournalStore::new(),
            chat,
            preferences: PreferencesStore::new(kv),
            supabase,
            quotes,
            rate_limiter,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stoa_journal=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);
    if config.openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail");
    }

    let state = AppState::build(config.clone()).await?;
    spawn_rate_limit_cleanup(state.rate_limiter.clone());

    let app = build_router(state)?;

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    // Connect info feeds the per-IP auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/guest", post(handlers::auth::guest))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/session", get(handlers::auth::session_status))
        .route("/api/quotes", get(handlers::quotes::list_quotes))
        .route("/api/prompts", get(handlers::catalog::list_prompts))
        .route("/api/philosophers", get(handlers::catalog::list_philosophers))
        .route("/api/philosophers/quote", get(handlers::catalog::random_quote))
        .route(
            "/api/preferences",
            get(handlers::preferences::get_preferences)
                .put(handlers::preferences::update_preferences),
        )
        .route("/api/onboarding", post(handlers::preferences::complete_onboarding))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Journal
        .route(
            "/api/entries",
            get(handlers::journal::list_entries).post(handlers::journal::create_entry),
        )
        .route("/api/entries/sync", post(handlers::journal::sync_entries))
        // Insights
        .route("/api/insights", get(handlers::insights::get_insights))
        // Chat
        .route(
            "/api/chat",
            get(handlers::chat::get_transcript)
                .post(handlers::chat::send_message)
                .delete(handlers::chat::clear_transcript),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_session,
        ));

    let allowed_origins = state
        .config
        .allowed_origins()
        .into_iter()
        .map(|origin| {
            origin
                .parse::<axum::http::HeaderValue>()
                .with_context(|| format!("{origin} is not a valid origin"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn route_not_found(uri: axum::http::Uri) -> error::AppError {
    error::AppError::NotFound(format!("No route for {}", uri.path()))
}

fn spawn_rate_limit_cleanup(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use tokio_tungstenite::tungstenite::{
        client::IntoClientRequest, handshake::client::Request as WsRequest, Error as WsError,
        Message as WsMessage,
    };
    use tower::ServiceExt;

    const TOKEN_BODY: &str =
        r#"{"access_token":"tok-1","refresh_token":"ref-1","expires_in":3600,"user":{"id":"user-1","email":"a@b.com"}}"#;

    struct Harness {
        app: Router,
        state: AppState,
        _dir: tempfile::TempDir,
    }

    async fn harness(server: &mockito::ServerGuard, tweak: impl FnOnce(&mut Config)) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_tests(&server.url(), dir.path().to_path_buf());
        tweak(&mut config);

        let state = AppState::build(Arc::new(config)).await.unwrap();
        let app = build_router(state.clone())
            .unwrap()
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        Harness { app, state, _dir: dir }
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Serves the full router on an ephemeral port, as `main` does.
    async fn serve(state: AppState) -> SocketAddr {
        let app = build_router(state).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });
        addr
    }

    fn ws_request(addr: SocketAddr, origin: Option<&str>) -> WsRequest {
        let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
        if let Some(origin) = origin {
            request.headers_mut().insert("origin", origin.parse().unwrap());
        }
        request
    }

    async fn wait_for_subscriber(journal: &JournalStore) {
        for _ in 0..100 {
            if journal.subscriber_count() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("event stream never subscribed");
    }

    async fn next_frame<S>(socket: &mut S) -> Value
    where
        S: futures_util::Stream<Item = Result<WsMessage, WsError>> + Unpin,
    {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .unwrap();
            if let WsMessage::Text(text) = message {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    fn rejected_status(result: Result<impl Sized, WsError>) -> StatusCode {
        match result {
            Err(WsError::Http(response)) => {
                StatusCode::from_u16(response.status().as_u16()).unwrap()
            }
            Err(other) => panic!("unexpected handshake error: {other}"),
            Ok(_) => panic!("upgrade should have been rejected"),
        }
    }

    async fn mock_login(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/auth/v1/token")
            .match_query(mockito::Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await
    }

    async fn login(app: &Router) {
        let (status, _) = call(
            app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "a@b.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;

        let (status, body) = call(&h.app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;

        let (status, body) = call(&h.app, "GET", "/api/entries", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]["message"].is_string());
        assert_eq!(body["error"]["code"], 401);
    }

    #[tokio::test]
    async fn test_login_status_hides_tokens() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let h = harness(&server, |_| {}).await;

        login(&h.app).await;
        let (status, body) = call(&h.app, "GET", "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signed_in"], true);
        assert_eq!(body["user_id"], "user-1");
        assert!(body.get("access_token").is_none());
    }

    #[tokio::test]
    async fn test_signup_validation_error() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;

        let (status, _) = call(
            &h.app,
            "POST",
            "/api/auth/signup",
            Some(json!({"email": "a@b.com", "password": "123"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_auth_rate_limit() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |config| config.auth_rate_limit_max = 2).await;
        let bad = json!({"email": "nope", "password": "x"});

        for _ in 0..2 {
            let (status, _) = call(&h.app, "POST", "/api/auth/login", Some(bad.clone())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
        let (status, _) = call(&h.app, "POST", "/api/auth/login", Some(bad)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_create_entry_then_insights() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let upload = server
            .mock("POST", "/rest/v1/journal_entries")
            .match_header("authorization", "Bearer tok-1")
            .with_status(201)
            .create_async()
            .await;
        let h = harness(&server, |_| {}).await;
        let mut events = h.state.journal.subscribe();

        login(&h.app).await;
        let (status, body) = call(
            &h.app,
            "POST",
            "/api/entries",
            Some(json!({
                "title": "Morning",
                "content": "Calm start.",
                "mood": "positive",
                "prompt": "gratitude",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["synced"], true);
        assert_eq!(body["entry"]["mood"], "positive");
        upload.assert_async().await;
        assert!(events.recv().await.is_ok());

        let (_, entries) = call(&h.app, "GET", "/api/entries", None).await;
        assert_eq!(entries.as_array().unwrap().len(), 1);

        let (status, insights) = call(&h.app, "GET", "/api/insights", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(insights["current_streak"], 1);
        assert_eq!(insights["total_entries"], 1);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_local_entry() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        server
            .mock("POST", "/rest/v1/journal_entries")
            .with_status(500)
            .create_async()
            .await;
        let h = harness(&server, |_| {}).await;

        login(&h.app).await;
        let (status, body) = call(
            &h.app,
            "POST",
            "/api/entries",
            Some(json!({"title": "Evening", "content": "Tired."})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["synced"], false);
        assert_eq!(h.state.journal.len().await, 1);
    }

    #[tokio::test]
    async fn test_sync_replaces_local_entries() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        server
            .mock("GET", "/rest/v1/journal_entries")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()),
                mockito::Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"user_id":"user-1","title":"Remote","content":"From the server","mood":"negative","created_at":"2026-02-10T08:00:00Z"}]"#,
            )
            .create_async()
            .await;
        let h = harness(&server, |_| {}).await;

        login(&h.app).await;
        let (status, body) = call(&h.app, "POST", "/api/entries/sync?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let entries = h.state.journal.entries().await;
        assert_eq!(entries[0].title, "Remote");
    }

    #[tokio::test]
    async fn test_chat_uses_selected_philosopher() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let completion = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("<name>Seneca</name>".into()))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Time is all we own."}}]}"#)
            .create_async()
            .await;
        let h = harness(&server, |_| {}).await;

        login(&h.app).await;
        let (status, _) = call(
            &h.app,
            "PUT",
            "/api/preferences",
            Some(json!({"selected_philosopher": "Seneca"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let message = json!({"message": "How do I rest?"});
        let (status, body) = call(&h.app, "POST", "/api/chat", Some(message)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["philosopher"], "Seneca");
        assert_eq!(body["reply"]["content"], "Time is all we own.");
        completion.assert_async().await;

        let (_, transcript) = call(&h.app, "GET", "/api/chat", None).await;
        assert_eq!(transcript.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_user_state() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        server
            .mock("POST", "/auth/v1/logout")
            .with_status(204)
            .create_async()
            .await;
        let h = harness(&server, |_| {}).await;

        login(&h.app).await;
        call(
            &h.app,
            "POST",
            "/api/entries",
            Some(json!({"title": "Local", "content": "Only here.", "sync": false})),
        )
        .await;
        assert_eq!(h.state.journal.len().await, 1);

        let (status, _) = call(&h.app, "POST", "/api/auth/logout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.state.journal.len().await, 0);

        let (status, _) = call(&h.app, "GET", "/api/entries", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_onboarding_and_catalogs() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;

        let onboarding = json!({"trait": "stoic"});
        let (status, prefs) = call(&h.app, "POST", "/api/onboarding", Some(onboarding)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prefs["selected_philosopher"], "Marcus Aurelius");
        assert_eq!(prefs["has_completed_onboarding"], true);

        let (_, topics) = call(&h.app, "GET", "/api/prompts", None).await;
        assert_eq!(topics.as_array().unwrap().len(), 7);

        let (_, philosophers) = call(&h.app, "GET", "/api/philosophers", None).await;
        assert_eq!(philosophers.as_array().unwrap().len(), 3);

        let (_, quote) = call(&h.app, "GET", "/api/philosophers/quote?name=Plato", None).await;
        assert_eq!(quote["quote"], "Wisdom comes from within.");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;

        let (status, body) = call(&h.app, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No route for /api/nope");
    }

    #[tokio::test]
    async fn test_event_stream_forwards_new_entries() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let h = harness(&server, |_| {}).await;
        h.state.session.sign_in("a@b.com", "hunter22").await.unwrap();
        let addr = serve(h.state.clone()).await;

        let (mut socket, _) =
            tokio_tungstenite::connect_async(ws_request(addr, Some("http://localhost:3000")))
                .await
                .unwrap();
        wait_for_subscriber(&h.state.journal).await;

        call(
            &h.app,
            "POST",
            "/api/entries",
            Some(json!({"title": "Dawn", "content": "Quiet.", "sync": false})),
        )
        .await;

        let frame = next_frame(&mut socket).await;
        assert_eq!(frame["type"], "entry_added");
        assert_eq!(frame["entry"]["title"], "Dawn");
    }

    #[tokio::test]
    async fn test_lagging_event_stream_gets_resync() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let mut h = harness(&server, |_| {}).await;
        h.state.journal = JournalStore::with_capacity(4);
        h.state.session.sign_in("a@b.com", "hunter22").await.unwrap();
        let addr = serve(h.state.clone()).await;

        let (mut socket, _) = tokio_tungstenite::connect_async(ws_request(addr, None))
            .await
            .unwrap();
        wait_for_subscriber(&h.state.journal).await;

        // Single-threaded runtime: nothing is forwarded until this loop yields.
        for i in 0..20 {
            let entry = models::journal::JournalEntry::new(
                format!("entry {i}"),
                "content".into(),
                models::journal::Mood::Neutral,
                None,
            );
            h.state.journal.add_entry(entry).await;
        }

        let frame = next_frame(&mut socket).await;
        assert_eq!(frame["type"], "resync");
        assert!(frame["skipped"].as_u64().unwrap() > 0);

        let frame = next_frame(&mut socket).await;
        assert_eq!(frame["type"], "entry_added");
    }

    #[tokio::test]
    async fn test_event_stream_rejects_foreign_origin() {
        let mut server = mockito::Server::new_async().await;
        mock_login(&mut server).await;
        let h = harness(&server, |_| {}).await;
        h.state.session.sign_in("a@b.com", "hunter22").await.unwrap();
        let addr = serve(h.state.clone()).await;

        let result =
            tokio_tungstenite::connect_async(ws_request(addr, Some("https://evil.example"))).await;
        assert_eq!(rejected_status(result), StatusCode::FORBIDDEN);
        assert_eq!(h.state.journal.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_stream_requires_session() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;
        let addr = serve(h.state.clone()).await;

        let result =
            tokio_tungstenite::connect_async(ws_request(addr, Some("http://localhost:3000"))).await;
        assert_eq!(rejected_status(result), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_loopback_auth_budget_allows_retries() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, |_| {}).await;
        let bad = json!({"email": "nope", "password": "x"});

        // Every local client shares 127.0.0.1, so a handful of typos must not lock it out.
        for _ in 0..10 {
            let (status, _) = call(&h.app, "POST", "/api/auth/login", Some(bad.clone())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
}
