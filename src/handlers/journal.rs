use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::dto::{CreateEntryRequest, CreateEntryResponse, SyncQuery, SyncResponse};
use crate::error::{AppError, AppResult};
use crate::models::journal::{JournalEntry, RemoteJournalEntry};
use crate::models::prompt::{find_prompt, ReflectionPrompt};
use crate::models::session::Session;
use crate::AppState;

pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<JournalEntry>> {
    Json(state.journal.entries().await)
}

/// Adds the entry locally, then uploads it when asked to.
///
/// A failed upload is logged and reported through `synced`; the local entry
/// stays either way.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<CreateEntryResponse>)> {
    body.validate()?;
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return Err(AppError::Validation("Title and content must not be blank".into()));
    }

    let prompt = body
        .prompt
        .as_deref()
        .map(|text| find_prompt(text).unwrap_or_else(|| ReflectionPrompt::from_text(text.trim())));
    let entry = JournalEntry::new(body.title, body.content, body.mood, prompt);

    state.journal.add_entry(entry.clone()).await;
    tracing::info!(entry_id = %entry.id, mood = %entry.mood, "Journal entry added");

    let synced = if body.sync {
        let (user_id, token) = session.credentials().ok_or(AppError::Unauthorized)?;
        match state.supabase.insert_entry(user_id, token, &entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(entry_id = %entry.id, error = %e, "Entry upload failed");
                false
            }
        }
    } else {
        false
    };

    Ok((StatusCode::CREATED, Json(CreateEntryResponse { entry, synced })))
}

/// Replaces the local list with the remote one, newest first.
pub async fn sync_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SyncQuery>,
) -> AppResult<Json<SyncResponse>> {
    query.validate()?;
    let (user_id, token) = session.credentials().ok_or(AppError::Unauthorized)?;

    let remote = state.supabase.fetch_entries(user_id, token, query.limit).await?;
    let entries: Vec<JournalEntry> =
        remote.into_iter().map(RemoteJournalEntry::into_entry).collect();

    state.journal.replace_all(entries.clone()).await;
    tracing::info!(user_id = %user_id, count = entries.len(), "Journal synced from remote");

    Ok(Json(SyncResponse {
        count: entries.len(),
        entries,
    }))
}
