//! Axum router setup for the Trellis server

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{get_canvas, get_tree, health_check, sync_workspace},
    ServerState,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/projects/:project_id/sync", post(sync_workspace))
        .route("/api/tree", get(get_tree))
        .route("/api/services/:id/canvas", get(get_canvas))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
