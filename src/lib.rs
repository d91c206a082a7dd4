//! # MediaSync Server Library
//!
//! Exposes one or more disk directory trees over HTTP: clients list the files
//! with their checksums, download them, and delete them once synced. An
//! in-memory mirror of the trees is kept in step with the disk, pruning empty
//! directories along the way.
//!
//! ## Core Components
//!
//! - [`scanner`]: filesystem object tree, content cache, monitors, registry
//! - [`listing`]: the two `/fileinfo` strategies (cache snapshot, registry rescan)
//! - [`routes`]: HTTP handlers
//! - [`config`]: layered configuration loading
//! - [`error`]: core and HTTP error types
//! - [`metrics`]: process counters
//! - [`state`]: shared application state

pub mod config;
pub mod error;
pub mod listing;
pub mod metrics;
pub mod routes;
pub mod scanner;
pub mod state;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::routes::download::{self, DownloadHandler};
use crate::scanner::normalize_prefix;
use crate::state::AppState;

/// Build the application router: `/fileinfo`, the health endpoints and one
/// download route pair per configured root.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/fileinfo", any(routes::fileinfo::file_info))
        .route("/healthz", get(routes::health::healthz))
        .route("/metrics", get(routes::health::metrics))
        .route("/version", get(routes::health::version));

    for fp in &state.config.file_paths {
        let prefix = normalize_prefix(&fp.serve_path);
        let handler = Arc::new(DownloadHandler::new(
            &fp.disk_path,
            &prefix,
            state.cache.clone(),
            state.metrics.clone(),
        ));
        let method_router = any(download::serve).with_state(handler);
        app = app
            .route(&prefix, method_router.clone())
            .route(&format!("{}{{*rest}}", prefix), method_router);
    }

    app.with_state(state).layer(TraceLayer::new_for_http())
}
