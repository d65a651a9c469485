use axum::{extract::State, Json};
use chrono::Local;

use crate::services::insights::{summarize, InsightsSummary};
use crate::AppState;

pub async fn get_insights(State(state): State<AppState>) -> Json<InsightsSummary> {
    let entries = state.journal.entries().await;
    Json(summarize(&entries, Local::now().date_naive()))
}
