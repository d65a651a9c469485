use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::error::AppError;
use crate::AppState;

/// Requires a signed-in session and hands it to the handler as an
/// `Extension<Session>`. An expired session is refreshed once before giving up.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut session = state.session.current().await;
    if !session.is_active() {
        return Err(AppError::Unauthorized);
    }

    if session.is_expired(Utc::now()) {
        if session.refresh_token.is_none() {
            return Err(AppError::Unauthorized);
        }
        tracing::debug!(user_id = ?session.user_id, "Access token expired, refreshing");
        session = state.session.refresh().await?;
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
