pub mod claims;
pub mod entities;
pub mod health;
pub mod heartbeat;
pub mod history;

use crate::db::Repository;
use crate::error::AppError;
use crate::orchestration::{CycleError, Heartbeat};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub heartbeat: Arc<Heartbeat>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, heartbeat: Arc<Heartbeat>) -> Self {
        Self { repo, heartbeat }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/heartbeat", post(heartbeat::run_heartbeat))
        .route("/v1/status", get(heartbeat::get_status))
        .route("/v1/history", get(history::get_history))
        .route("/v1/claims", post(claims::claim_all))
        .route("/v1/entities", get(entities::list_entities))
        .route("/v1/entities/:symbol", get(entities::get_entity))
        .layer(cors)
        .with_state(state)
}

/// Run a state-changing operation on its own task.
///
/// A client that disconnects drops the handler future; the spawned task still
/// runs to completion, so submitted claims are always written to history.
pub(crate) async fn detached<T, F>(operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, CycleError>> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::spawn(operation)
        .await
        .map_err(|e| AppError::Internal(format!("cycle task failed: {}", e)))?;
    Ok(result?)
}
