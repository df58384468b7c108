use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use textileops_core::{DomainError, ItemId, Units};
use textileops_infra::ledger::ItemLedger;
use textileops_inventory::{InventoryItem, InventorySummary, Reconciliation};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::{body, message, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/summary/all", get(inventory_summary))
        .route("/low-stock/:threshold", get(low_stock))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/ledger", get(item_ledger))
        .route("/:id/reconciliation", get(reconcile_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(services.items.list().await?))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InventoryItem>)> {
    let item = services.items.create(body(req)?.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InventoryItem>> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(services.items.get(id).await?))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    req: Result<Json<dto::UpdateItemRequest>, JsonRejection>,
) -> ApiResult<Json<InventoryItem>> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(services.items.update(id, body(req)?.into()).await?))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id: ItemId = parse_id(&id)?;
    services.items.delete(id).await?;
    Ok(message("Item deleted successfully"))
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(threshold): Path<String>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let threshold = threshold
        .parse::<Units>()
        .map_err(|_| DomainError::validation("threshold must be a number"))?;
    Ok(Json(services.items.low_stock(threshold).await?))
}

pub async fn inventory_summary(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<InventorySummary>> {
    Ok(Json(services.items.summary().await?))
}

pub async fn item_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemLedger>> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(services.ledger.item_ledger(id).await?))
}

pub async fn reconcile_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Reconciliation>> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(services.ledger.reconcile(id).await?))
}
