use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::OnboardingRequest;
use crate::error::AppResult;
use crate::models::preferences::UserPreferences;
use crate::store::preferences::PreferencesUpdate;
use crate::AppState;

pub async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    Json(state.preferences.get().await)
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<PreferencesUpdate>,
) -> AppResult<Json<UserPreferences>> {
    Ok(Json(state.preferences.apply(body).await?))
}

pub async fn complete_onboarding(
    State(state): State<AppState>,
    Json(body): Json<OnboardingRequest>,
) -> AppResult<Json<UserPreferences>> {
    body.validate()?;
    Ok(Json(state.preferences.complete_onboarding(&body.personality).await?))
}
