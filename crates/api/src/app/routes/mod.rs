use axum::{routing::get, Router};

pub mod attendance;
pub mod common;
pub mod inventory;
pub mod movements;
pub mod payroll;
pub mod system;
pub mod workers;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/workers", workers::router())
        .nest("/attendance", attendance::router())
        .nest("/payroll", payroll::router())
        .nest("/inventory", inventory::router())
        .nest("/movements", movements::router())
}
