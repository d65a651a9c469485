use axum::{
    extract::{Query, State},
    Json,
};

use crate::dto::{PhilosopherQuoteQuery, PhilosopherQuoteResponse};
use crate::models::philosopher::{Philosopher, PHILOSOPHERS};
use crate::models::prompt::{topics, ReflectionTopic};
use crate::AppState;

pub async fn list_prompts() -> Json<Vec<ReflectionTopic>> {
    Json(topics())
}

pub async fn list_philosophers() -> Json<&'static [Philosopher]> {
    Json(PHILOSOPHERS.as_slice())
}

/// Unknown names still get an answer: the generic fallback quote.
pub async fn random_quote(
    State(state): State<AppState>,
    Query(query): Query<PhilosopherQuoteQuery>,
) -> Json<PhilosopherQuoteResponse> {
    let philosopher = match query.name {
        Some(name) => name.trim().to_string(),
        None => state.preferences.get().await.selected_philosopher,
    };
    let quote = Philosopher::random_quote(&philosopher).to_string();

    Json(PhilosopherQuoteResponse { philosopher, quote })
}
