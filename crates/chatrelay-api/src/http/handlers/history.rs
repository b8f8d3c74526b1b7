//! Session history retrieval handler.
//!
//! GET /api/history?session_id=...

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::AppError;
use crate::state::AppState;

/// Query parameters for history retrieval.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub session_id: String,
}

/// GET /api/history - full ordered history for one session.
///
/// Served from the cache when loaded; otherwise replayed from the store
/// (which also seeds the cache for subsequent calls).
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let history = state.pipeline.get_history(&query.session_id).await?;
    Ok(Json(json!({ "history": history })))
}
