use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::{detached, AppState};
use crate::error::AppError;
use crate::orchestration::{CycleResult, StatusReport};

#[derive(Debug, Deserialize)]
pub struct HeartbeatQuery {
    pub claim: Option<bool>,
}

/// Run one cycle. Claims are live only with `?claim=true`.
pub async fn run_heartbeat(
    Query(params): Query<HeartbeatQuery>,
    State(state): State<AppState>,
) -> Result<Json<CycleResult>, AppError> {
    let claim = params.claim.unwrap_or(false);
    let heartbeat = state.heartbeat.clone();
    let result = detached(async move { heartbeat.run(claim).await }).await?;
    Ok(Json(result))
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.heartbeat.status().await?))
}
