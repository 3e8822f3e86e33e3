//! Conversation history endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Html;
use ostwald_core::models::StoredMessage;
use ostwald_core::transcript::Transcript;
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only the most recent `limit` messages.
    pub limit: Option<i64>,
}

impl HistoryQuery {
    fn checked_limit(&self) -> AppResult<Option<i64>> {
        match self.limit {
            Some(limit) if limit < 0 => Err(AppError::Validation(format!(
                "limit must not be negative, got {limit}"
            ))),
            limit => Ok(limit),
        }
    }
}

/// `GET /history`: logged messages, oldest first.
pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<StoredMessage>>> {
    Ok(Json(state.store.history(query.checked_limit()?).await?))
}

/// `GET /transcript`: logged messages as chat bubble HTML.
pub async fn transcript_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Html<String>> {
    let messages = state.store.history(query.checked_limit()?).await?;
    Ok(Html(Transcript::from_history(&messages).to_html()))
}
