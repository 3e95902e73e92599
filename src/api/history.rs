use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::AppState;
use crate::db::HistoryView;
use crate::error::AppError;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

fn resolve_limit(limit: Option<usize>) -> Result<usize, AppError> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(0) => Err(AppError::BadRequest("limit must be positive".to_string())),
        Some(n) => Ok(n.min(MAX_LIMIT)),
    }
}

pub async fn get_history(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryView>, AppError> {
    let limit = resolve_limit(params.limit)?;
    Ok(Json(state.heartbeat.history(limit).await?))
}
