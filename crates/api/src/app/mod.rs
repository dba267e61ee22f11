//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and job registry wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use tribute_infra::jobs::CleanupJobs;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every request gets a `tower_http` trace span.
pub fn build_app(jobs: Arc<CleanupJobs>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router().layer(Extension(jobs)))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
