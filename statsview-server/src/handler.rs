//! Route handlers and error mapping.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use statsview_core::{ChartSpec, MemoryReclaimer, SamplePoint, ViewerError, ViewerRegistry};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown viewer: {0}")]
    UnknownViewer(String),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownViewer(_) => StatusCode::NOT_FOUND,
            ApiError::Viewer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Viewer request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Outcome of a forced heap release.
#[derive(Debug, Serialize)]
pub struct ReleaseReport {
    pub released: bool,
}

pub(crate) async fn view(
    State(registry): State<Arc<ViewerRegistry>>,
    Path(name): Path<String>,
) -> Result<Json<SamplePoint>, ApiError> {
    let viewer = registry
        .get(&name)
        .ok_or_else(|| ApiError::UnknownViewer(name.clone()))?;

    let point = viewer.serve().await?;
    Ok(Json(point))
}

pub(crate) async fn chart(
    State(registry): State<Arc<ViewerRegistry>>,
    Path(name): Path<String>,
) -> Result<Json<ChartSpec>, ApiError> {
    let viewer = registry
        .get(&name)
        .ok_or_else(|| ApiError::UnknownViewer(name.clone()))?;

    Ok(Json(viewer.chart().clone()))
}

pub(crate) async fn charts(State(registry): State<Arc<ViewerRegistry>>) -> Json<Vec<ChartSpec>> {
    Json(registry.all().iter().map(|v| v.chart().clone()).collect())
}

pub(crate) async fn release(
    State(reclaimer): State<Arc<dyn MemoryReclaimer>>,
) -> Json<ReleaseReport> {
    let released = reclaimer.release_memory();
    info!(released, "Forced heap release");
    Json(ReleaseReport { released })
}
