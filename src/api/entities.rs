use axum::extract::{Path, State};
use axum::Json;

use crate::api::AppState;
use crate::domain::TrackedEntity;
use crate::error::AppError;

pub async fn list_entities(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackedEntity>>, AppError> {
    Ok(Json(state.repo.list_entities().await?))
}

pub async fn get_entity(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TrackedEntity>, AppError> {
    state
        .repo
        .get_entity(&symbol)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("entity {}", symbol)))
}
