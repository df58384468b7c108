use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use textileops_core::{ItemId, MovementId, Period};
use textileops_infra::ledger::{DeletedMovement, MovementListing, RecordedMovement};
use textileops_inventory::{MovementFilter, MovementType, RecordMovement, StockMovement};

use crate::app::dto;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{body, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_movements).post(record_movement))
        .route("/item/:item_id", get(movements_for_item))
        .route("/period/:start/:end", get(movements_for_period))
        .route("/type/:movement_type", get(movements_by_type))
        .route("/:id", get(get_movement).delete(delete_movement))
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<dto::RecordMovementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecordedMovement>)> {
    let cmd = RecordMovement::try_from(body(req)?)?;
    let recorded = services.ledger.record(cmd).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::MovementQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MovementListing>>> {
    let Query(query) = query.map_err(ApiError::from)?;
    Ok(Json(services.ledger.list(query.into_filter()?).await?))
}

pub async fn movements_for_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
) -> ApiResult<Json<Vec<MovementListing>>> {
    let item_id: ItemId = parse_id(&item_id)?;
    // Confirm the item exists so an unknown id is a 404, not an empty list.
    services.items.get(item_id).await?;
    let filter = MovementFilter {
        item_id: Some(item_id),
        ..MovementFilter::default()
    };
    Ok(Json(services.ledger.list(filter).await?))
}

pub async fn movements_for_period(
    Extension(services): Extension<Arc<AppServices>>,
    Path((start, end)): Path<(String, String)>,
) -> ApiResult<Json<Vec<MovementListing>>> {
    let period = Period::parse(&start, &end)?;
    Ok(Json(services.ledger.for_period(period).await?))
}

pub async fn movements_by_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(movement_type): Path<String>,
) -> ApiResult<Json<Vec<MovementListing>>> {
    let movement_type: MovementType = movement_type.parse()?;
    let filter = MovementFilter {
        movement_type: Some(movement_type),
        ..MovementFilter::default()
    };
    Ok(Json(services.ledger.list(filter).await?))
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StockMovement>> {
    let id: MovementId = parse_id(&id)?;
    Ok(Json(services.ledger.get(id).await?))
}

pub async fn delete_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedMovement>> {
    let id: MovementId = parse_id(&id)?;
    Ok(Json(services.ledger.delete(id).await?))
}
