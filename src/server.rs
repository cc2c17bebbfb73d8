//! HTTP server exposing the explorer view model

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::available_options;
use crate::error::ExplorerError;
use crate::explorer::{ExploreRequest, ExplorerEngine, ExplorerView};
use crate::types::AggregationOption;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ExplorerEngine>,
    pub include_staff_options: bool,
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<ExplorerError>() {
        Some(ExplorerError::PostNotFound(_)) => StatusCode::NOT_FOUND,
        Some(ExplorerError::StaffOnly(_)) => StatusCode::FORBIDDEN,
        Some(ExplorerError::InvalidDate(_)) | Some(ExplorerError::MalformedSelection(_)) => {
            StatusCode::BAD_REQUEST
        }
        Some(ExplorerError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Explore handler
pub async fn explore_handler(
    State(state): State<AppState>,
    Json(req): Json<ExploreRequest>,
) -> Result<Json<ExplorerView>, (StatusCode, Json<ErrorResponse>)> {
    let post_id = req.post_id;
    match state.engine.explore(req).await {
        Ok(view) => {
            info!(
                "Explore successful: post={}, {} list items, pending={}, errors={}",
                post_id,
                view.list_items.len(),
                view.is_any_pending,
                view.has_any_error
            );
            Ok(Json(view))
        }
        Err(e) => {
            error!("Explore failed for post {}: {:?}", post_id, e);
            Err((
                status_for(&e),
                Json(ErrorResponse {
                    error: "Explore failed".to_string(),
                    details: e.to_string(),
                }),
            ))
        }
    }
}

/// Catalog of selectable methods
pub async fn options_handler(State(state): State<AppState>) -> Json<Vec<AggregationOption>> {
    Json(available_options(state.include_staff_options).cloned().collect())
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "aggexplorer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/options", get(options_handler))
        .route("/explore", post(explore_handler))
        .with_state(state)
}

pub async fn run_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting aggregation explorer server on {}", addr);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
