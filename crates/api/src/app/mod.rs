//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: in-memory store, mailer and job runner
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and the success envelope
//! - `errors.rs`: the error envelope

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use tutorbook_infra::jobs::JobRunner;
use tutorbook_infra::Services;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over the given services.
pub fn build_app(services: Arc<Services>, jobs: Arc<JobRunner>) -> Router {
    let api = routes::router()
        .layer(Extension(services))
        .layer(Extension(jobs))
        .layer(axum::middleware::from_fn(middleware::request_context_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(ServiceBuilder::new())
}
