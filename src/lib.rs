//! Rate limited byte-range media streaming.
//!
//! One route serves a single configured media file in bounded chunks with
//! `206 Partial Content` semantics, behind a per-client sliding-window rate
//! limiter. `/health` and `/metrics` sit next to it.

pub mod client_key;
pub mod config;
pub mod error;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod models;
pub mod range;
pub mod rate_limit;
pub mod state;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;

use crate::handlers::{health_handler, media_handler, metrics_handler};
use crate::state::AppState;

/// Build the router with the media route mounted at `media_route`.
pub fn app(state: Arc<AppState>, media_route: &str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(media_route, get(media_handler))
        .with_state(state)
}
