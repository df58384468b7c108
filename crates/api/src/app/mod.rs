//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repositories sharing one SQLite pool
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and their conversion into domain inputs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router around already-wired services.
pub fn build_app(services: AppServices) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(Arc::new(services))),
        )
}
