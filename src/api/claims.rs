use axum::extract::State;
use axum::Json;

use crate::api::{detached, AppState};
use crate::domain::ClaimBatch;
use crate::error::AppError;

/// Live claim across every eligible entity, outside a regular cycle.
pub async fn claim_all(State(state): State<AppState>) -> Result<Json<ClaimBatch>, AppError> {
    let heartbeat = state.heartbeat.clone();
    let batch = detached(async move { heartbeat.claim_all().await }).await?;
    Ok(Json(batch))
}
