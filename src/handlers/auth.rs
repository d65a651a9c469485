use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use validator::Validate;

use crate::dto::{LoginRequest, MessageResponse, SignUpRequest};
use crate::error::AppResult;
use crate::models::session::SessionStatus;
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<SessionStatus>)> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    let session = state.session.sign_up(&email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(SessionStatus::of(&session, Utc::now()))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<SessionStatus>> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    let session = state.session.sign_in(&email, &body.password).await?;
    Ok(Json(SessionStatus::of(&session, Utc::now())))
}

pub async fn guest(State(state): State<AppState>) -> AppResult<(StatusCode, Json<SessionStatus>)> {
    let session = state.session.sign_in_as_guest().await?;
    Ok((StatusCode::CREATED, Json(SessionStatus::of(&session, Utc::now()))))
}

pub async fn refresh(State(state): State<AppState>) -> AppResult<Json<SessionStatus>> {
    let session = state.session.refresh().await?;
    Ok(Json(SessionStatus::of(&session, Utc::now())))
}

pub async fn session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    let session = state.session.current().await;
    Json(SessionStatus::of(&session, Utc::now()))
}

/// Ends the session along with the journal and chat state scoped to it.
pub async fn logout(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    state.session.logout().await?;
    state.journal.clear().await;
    state.chat.clear().await;

    Ok(Json(MessageResponse::new("Logged out")))
}
