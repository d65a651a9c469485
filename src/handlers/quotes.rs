use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::quote::Quote;
use crate::AppState;

pub async fn list_quotes(State(state): State<AppState>) -> AppResult<Json<Vec<Quote>>> {
    Ok(Json(state.quotes.fetch().await?))
}
