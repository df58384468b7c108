use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use textileops_core::WorkerId;
use textileops_workforce::{Worker, WorkerStats, ROLE_CATEGORIES};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::{body, message, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_workers).post(create_worker))
        .route("/stats/summary", get(worker_stats))
        .route("/roles", get(role_categories))
        .route("/:id", get(get_worker).put(update_worker).delete(delete_worker))
}

pub async fn list_workers(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Worker>>> {
    Ok(Json(services.workers.list_active().await?))
}

pub async fn create_worker(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<dto::CreateWorkerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Worker>)> {
    let worker = services.workers.create(body(req)?.into()).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

pub async fn get_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Worker>> {
    let id: WorkerId = parse_id(&id)?;
    Ok(Json(services.workers.get(id).await?))
}

pub async fn update_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    req: Result<Json<dto::UpdateWorkerRequest>, JsonRejection>,
) -> ApiResult<Json<Worker>> {
    let id: WorkerId = parse_id(&id)?;
    Ok(Json(services.workers.update(id, body(req)?.into()).await?))
}

pub async fn delete_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id: WorkerId = parse_id(&id)?;
    services.workers.deactivate(id).await?;
    Ok(message("Worker deleted successfully"))
}

pub async fn worker_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<WorkerStats>> {
    Ok(Json(services.workers.stats().await?))
}

/// Suggested roles for worker forms; any non-empty role is accepted.
pub async fn role_categories() -> Json<&'static [&'static str]> {
    Json(&ROLE_CATEGORIES)
}
