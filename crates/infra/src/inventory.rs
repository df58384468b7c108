//! Inventory item repository.
//!
//! Item edits here never touch `quantity`; only [`crate::ledger::StockLedger`]
//! moves stock.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::instrument;

use textileops_core::{DomainError, ItemId, Money, Units};
use textileops_inventory::{InventoryItem, InventorySummary, ItemUpdate, NewItem};

use crate::error::{is_unique_violation, map_sqlx_error, StoreError, StoreResult};

const ITEM_COLUMNS: &str = "id, code, name, item_type, unit, opening_quantity, quantity, unit_cost, description, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    id: i64,
    code: String,
    name: String,
    item_type: String,
    unit: String,
    opening_quantity: i64,
    quantity: i64,
    unit_cost: i64,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: ItemId::new(row.id),
            code: row.code,
            name: row.name,
            item_type: row.item_type,
            unit: row.unit,
            opening_quantity: Units::from_milli(row.opening_quantity),
            quantity: Units::from_milli(row.quantity),
            unit_cost: Money::from_minor(row.unit_cost),
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fetch one item through any executor (pool or open transaction).
pub(crate) async fn fetch_item<'e, E>(executor: E, id: ItemId) -> StoreResult<Option<InventoryItem>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"
    ))
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("get_item", e))?;
    Ok(row.map(InventoryItem::from))
}

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, new_item), fields(code = %new_item.code), err)]
    pub async fn create(&self, new_item: NewItem) -> StoreResult<InventoryItem> {
        let item = new_item.validated()?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO inventory_items (
                code, name, item_type, unit, opening_quantity, quantity,
                unit_cost, description, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?8)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.item_type)
        .bind(&item.unit)
        .bind(item.opening_quantity.milli())
        .bind(item.unit_cost.minor())
        .bind(&item.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Domain(DomainError::conflict(format!(
                    "Item code '{}' already exists",
                    item.code
                )))
            } else {
                map_sqlx_error("create_item", e)
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    pub async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn get(&self, id: ItemId) -> StoreResult<InventoryItem> {
        fetch_item(&self.pool, id)
            .await?
            .ok_or(StoreError::Domain(DomainError::not_found("inventory item")))
    }

    /// Edit descriptive attributes and cost. Code and quantity are untouched.
    #[instrument(skip(self, update), fields(item_id = %id), err)]
    pub async fn update(&self, id: ItemId, update: ItemUpdate) -> StoreResult<InventoryItem> {
        let update = update.validated()?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET name = ?1, item_type = ?2, unit = ?3, unit_cost = ?4, description = ?5, updated_at = ?6
            WHERE id = ?7
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(&update.item_type)
        .bind(&update.unit)
        .bind(update.unit_cost.minor())
        .bind(&update.description)
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        row.map(InventoryItem::from)
            .ok_or(StoreError::Domain(DomainError::not_found("inventory item")))
    }

    /// Remove an item that no movement references.
    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn delete(&self, id: ItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| match map_sqlx_error("delete_item", e) {
                StoreError::Domain(DomainError::Conflict(_)) => StoreError::Domain(
                    DomainError::conflict("Item has stock movements; delete them first"),
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("inventory item").into());
        }
        Ok(())
    }

    /// Items at or below `threshold`, lowest stock first.
    #[instrument(skip(self), err)]
    pub async fn low_stock(&self, threshold: Units) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE quantity <= ?1 ORDER BY quantity, code"
        ))
        .bind(threshold.milli())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("low_stock", e))?;
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn summary(&self) -> StoreResult<InventorySummary> {
        let items = self.list().await?;
        Ok(InventorySummary::from_items(&items)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, DbConfig};

    async fn repo() -> ItemRepository {
        ItemRepository::new(connect(&DbConfig::in_memory()).await.unwrap())
    }

    fn units(s: &str) -> Units {
        s.parse().unwrap()
    }

    fn new_item(code: &str, quantity: &str) -> NewItem {
        NewItem {
            code: code.to_string(),
            name: format!("{code} name"),
            item_type: "Fabric".to_string(),
            unit: "m".to_string(),
            opening_quantity: units(quantity),
            unit_cost: Money::from_minor(1_000),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let repo = repo().await;
        let created = repo.create(new_item("FAB-1", "40.25")).await.unwrap();
        assert_eq!(created.quantity, units("40.25"));
        assert_eq!(created.opening_quantity, units("40.25"));

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let repo = repo().await;
        repo.create(new_item("FAB-1", "1")).await.unwrap();
        let err = repo.create(new_item("FAB-1", "2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_never_changes_quantity() {
        let repo = repo().await;
        let created = repo.create(new_item("BTN-1", "12")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                ItemUpdate {
                    name: "Buttons, brass".to_string(),
                    item_type: "Trim".to_string(),
                    unit: "pcs".to_string(),
                    unit_cost: Money::from_minor(35),
                    description: Some("18mm".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, units("12"));
        assert_eq!(updated.code, "BTN-1");
        assert_eq!(updated.item_type, "Trim");
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let repo = repo().await;
        let err = repo.get(ItemId::new(99)).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::NotFound("inventory item")));
        let err = repo.delete(ItemId::new(99)).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::NotFound("inventory item")));
    }

    #[tokio::test]
    async fn low_stock_and_summary() {
        let repo = repo().await;
        repo.create(new_item("A", "4.5")).await.unwrap();
        repo.create(new_item("B", "30")).await.unwrap();
        repo.create(new_item("C", "0")).await.unwrap();

        let low: Vec<String> = repo
            .low_stock(units("4.5"))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(low, vec!["C", "A"]);

        let summary = repo.summary().await.unwrap();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_quantity, units("34.5"));
        assert_eq!(summary.total_value, Money::from_minor(34_500));
        assert_eq!(summary.total_types, 1);
    }
}
