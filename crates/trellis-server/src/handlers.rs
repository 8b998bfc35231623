//! REST API handlers for the Trellis server

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_core::{CanvasGraph, FileTreeNode, RecordId};
use trellis_indexer::ScanError;
use trellis_sync::{Materializer, Reconciler, SyncError, SyncSummary};

use crate::ServerState;

/// Error returned to HTTP clients as `{ "error": message }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Internal(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SyncError::Scan(ScanError::InvalidPattern(_)) => ApiError::InvalidInput(err.to_string()),
            SyncError::Scan(_) | SyncError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        SyncError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub workspace_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub path: Option<PathBuf>,
}

/// Rescan a workspace and reconcile it into the project's graph.
pub async fn sync_workspace(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncSummary>, ApiError> {
    if project_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("project id is empty".to_string()));
    }
    if request.workspace_path.as_os_str().is_empty() {
        return Err(ApiError::InvalidInput("workspace_path is empty".to_string()));
    }

    let summary = tokio::task::spawn_blocking(move || {
        state
            .with_sync_lock(&project_id, &request.workspace_path, || {
                Reconciler::new(state.store.as_ref(), &state.scanner)
                    .sync(&project_id, &request.workspace_path)
            })
            .ok_or_else(|| ApiError::Internal("sync lock poisoned".to_string()))?
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("sync task failed: {e}")))??;

    Ok(Json(summary))
}

/// Scan a directory and return the classified tree without persisting it.
pub async fn get_tree(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<FileTreeNode>, ApiError> {
    let Some(path) = query.path.filter(|p| !p.as_os_str().is_empty()) else {
        return Err(ApiError::InvalidInput("missing `path` query parameter".to_string()));
    };

    let scan = tokio::task::spawn_blocking(move || state.scanner.scan(&path))
        .await
        .map_err(|e| ApiError::Internal(format!("scan task failed: {e}")))??;

    Ok(Json(scan.tree))
}

/// Materialize the canvas graph of a synced service.
pub async fn get_canvas(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<CanvasGraph>, ApiError> {
    let service_id: RecordId = id
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("invalid service id: {id}")))?;

    let graph = tokio::task::spawn_blocking(move || {
        Materializer::new(state.store.as_ref()).materialize(service_id)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("canvas task failed: {e}")))??;

    Ok(Json(graph))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(health)
}
