//! Stock ledger: movements and the quantity projection they drive.
//!
//! ## Atomicity
//!
//! Recording and deleting a movement each run in one transaction that
//! touches both the movement row and the item row. The quantity change is a
//! store-side update (`quantity = quantity + ?`), never a value computed from
//! an earlier read, so concurrent writers cannot lose each other's
//! adjustments.
//!
//! Quantities are bound as integer thousandths of a unit. The item table's
//! `CHECK` on `quantity` bounds the stock level; an adjustment that would
//! leave that range fails the update and is reported as a validation error.
//!
//! Each write transaction issues a write as its first statement. SQLite then
//! takes the write lock immediately and a competing writer waits on the busy
//! timeout instead of failing a read-to-write lock upgrade.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use textileops_core::{DomainError, ItemId, MovementId, Period, Quantity, Units};
use textileops_inventory::{
    InventoryItem, Ledger, MovementFilter, MovementType, NegativeStockPolicy, Reconciliation,
    RecordMovement, StockMovement, StockWarning,
};

use crate::error::{is_check_violation, map_sqlx_error, StoreError, StoreResult};
use crate::inventory::fetch_item;

const MOVEMENT_COLUMNS: &str =
    "id, item_id, movement_type, date, quantity, reference, notes, created_at";

#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    item_id: i64,
    movement_type: String,
    date: NaiveDate,
    quantity: i64,
    reference: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_movement(self, operation: &'static str) -> StoreResult<StockMovement> {
        let movement_type = self
            .movement_type
            .parse::<MovementType>()
            .map_err(|e| StoreError::corrupt_row(operation, e))?;
        let quantity = Quantity::new(Units::from_milli(self.quantity))
            .map_err(|e| StoreError::corrupt_row(operation, e))?;
        Ok(StockMovement {
            id: MovementId::new(self.id),
            item_id: ItemId::new(self.item_id),
            movement_type,
            date: self.date,
            quantity,
            reference: self.reference,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementListingRow {
    #[sqlx(flatten)]
    movement: MovementRow,
    code: String,
    name: String,
    item_type: String,
    unit: String,
}

/// A movement joined with the identifying fields of its item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementListing {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub unit: String,
}

/// Outcome of a successful [`StockLedger::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedMovement {
    pub movement: StockMovement,
    pub resulting_quantity: Units,
    pub warning: Option<StockWarning>,
}

/// Outcome of a successful [`StockLedger::delete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedMovement {
    pub movement: StockMovement,
    pub resulting_quantity: Units,
    pub warning: Option<StockWarning>,
}

/// An item together with its full movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemLedger {
    pub item: InventoryItem,
    /// Most recent first.
    pub movements: Vec<StockMovement>,
    pub reconciliation: Reconciliation,
}

/// Store-side `quantity = quantity + delta` on one item, returning the new
/// quantity, or `None` when the item does not exist.
async fn apply_delta(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: ItemId,
    delta: Units,
    now: DateTime<Utc>,
) -> Result<Option<Units>, sqlx::Error> {
    let resulting: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventory_items
        SET quantity = quantity + ?1, updated_at = ?2
        WHERE id = ?3
        RETURNING quantity
        "#,
    )
    .bind(delta.milli())
    .bind(now)
    .bind(item_id.get())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(resulting.map(Units::from_milli))
}

/// A `CHECK` failure on the item update means the stock level left its range.
fn out_of_range_or(operation: &'static str, item_id: ItemId, err: sqlx::Error) -> StoreError {
    if is_check_violation(&err) {
        DomainError::validation(format!(
            "stock for item {item_id} would leave the allowed range of +/-{}",
            Units::LIMIT
        ))
        .into()
    } else {
        map_sqlx_error(operation, err)
    }
}

/// The stock ledger service.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    policy: NegativeStockPolicy,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, policy: NegativeStockPolicy) -> Self {
        Self { pool, policy }
    }

    /// Append a movement and apply its signed quantity to the item, atomically.
    #[instrument(
        skip(self, cmd),
        fields(
            item_id = %cmd.item_id,
            movement_type = %cmd.movement_type,
            quantity = %cmd.quantity.get()
        ),
        err
    )]
    pub async fn record(&self, cmd: RecordMovement) -> StoreResult<RecordedMovement> {
        let delta = cmd.signed_delta();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("record_movement", e))?;

        let resulting = apply_delta(&mut tx, cmd.item_id, delta, now)
            .await
            .map_err(|e| out_of_range_or("record_movement", cmd.item_id, e))?;

        let Some(resulting_quantity) = resulting else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("record_movement", e))?;
            return Err(DomainError::not_found("inventory item").into());
        };

        let warning = match self
            .policy
            .evaluate(cmd.item_id, resulting_quantity - delta, delta)
        {
            Ok(w) => w,
            Err(refused) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("record_movement", e))?;
                tracing::info!(error = %refused, "movement refused by negative stock policy");
                return Err(refused.into());
            }
        };

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO stock_movements (item_id, movement_type, date, quantity, reference, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(cmd.item_id.get())
        .bind(cmd.movement_type.as_str())
        .bind(cmd.date)
        .bind(cmd.quantity.get().milli())
        .bind(&cmd.reference)
        .bind(&cmd.notes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("record_movement", e))?;
        let movement = row.into_movement("record_movement")?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("record_movement", e))?;

        if let Some(w) = &warning {
            tracing::warn!(movement_id = %movement.id, %resulting_quantity, "{w}");
        }
        tracing::info!(movement_id = %movement.id, %resulting_quantity, "movement recorded");

        Ok(RecordedMovement {
            movement,
            resulting_quantity,
            warning,
        })
    }

    /// Remove a movement and apply its exact inverse to the item, atomically.
    ///
    /// A second delete of the same id finds nothing and changes nothing.
    #[instrument(skip(self), fields(movement_id = %movement_id), err)]
    pub async fn delete(&self, movement_id: MovementId) -> StoreResult<DeletedMovement> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_movement", e))?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "DELETE FROM stock_movements WHERE id = ?1 RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(movement_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_movement", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("delete_movement", e))?;
            return Err(DomainError::not_found("movement").into());
        };
        let movement = row.into_movement("delete_movement")?;
        let compensation = movement.compensation();

        let resulting = apply_delta(&mut tx, movement.item_id, compensation, Utc::now())
            .await
            .map_err(|e| out_of_range_or("delete_movement", movement.item_id, e))?;

        let Some(resulting_quantity) = resulting else {
            // Foreign keys make this unreachable unless the schema was bypassed.
            return Err(StoreError::storage(
                "delete_movement",
                format!("movement {} references missing item {}", movement.id, movement.item_id),
            ));
        };

        let warning = match self.policy.evaluate(
            movement.item_id,
            resulting_quantity - compensation,
            compensation,
        ) {
            Ok(w) => w,
            Err(refused) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("delete_movement", e))?;
                tracing::info!(error = %refused, "deletion refused by negative stock policy");
                return Err(refused.into());
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_movement", e))?;

        if let Some(w) = &warning {
            tracing::warn!(movement_id = %movement.id, %resulting_quantity, "{w}");
        }
        tracing::info!(item_id = %movement.item_id, %resulting_quantity, "movement deleted");

        Ok(DeletedMovement {
            movement,
            resulting_quantity,
            warning,
        })
    }

    #[instrument(skip(self), fields(movement_id = %movement_id), err)]
    pub async fn get(&self, movement_id: MovementId) -> StoreResult<StockMovement> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE id = ?1"
        ))
        .bind(movement_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_movement", e))?;

        row.ok_or(StoreError::Domain(DomainError::not_found("movement")))?
            .into_movement("get_movement")
    }

    /// Movements matching `filter`, most recent first, with item details.
    #[instrument(skip(self), err)]
    pub async fn list(&self, filter: MovementFilter) -> StoreResult<Vec<MovementListing>> {
        let filter = filter.validated()?;

        let rows = sqlx::query_as::<_, MovementListingRow>(
            r#"
            SELECT
                sm.id, sm.item_id, sm.movement_type, sm.date, sm.quantity,
                sm.reference, sm.notes, sm.created_at,
                i.code, i.name, i.item_type, i.unit
            FROM stock_movements sm
            JOIN inventory_items i ON sm.item_id = i.id
            WHERE (?1 IS NULL OR sm.item_id = ?1)
              AND (?2 IS NULL OR sm.date >= ?2)
              AND (?3 IS NULL OR sm.date <= ?3)
              AND (?4 IS NULL OR sm.movement_type = ?4)
            ORDER BY sm.date DESC, sm.id DESC
            "#,
        )
        .bind(filter.item_id.map(ItemId::get))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.movement_type.map(MovementType::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.into_iter()
            .map(|r| {
                Ok(MovementListing {
                    movement: r.movement.into_movement("list_movements")?,
                    code: r.code,
                    name: r.name,
                    item_type: r.item_type,
                    unit: r.unit,
                })
            })
            .collect()
    }

    /// Movements dated inside `period` (inclusive), most recent first.
    pub async fn for_period(&self, period: Period) -> StoreResult<Vec<MovementListing>> {
        self.list(MovementFilter {
            from: Some(period.start()),
            to: Some(period.end()),
            ..MovementFilter::default()
        })
        .await
    }

    /// An item with its movements and reconciliation, read from one snapshot.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn item_ledger(&self, item_id: ItemId) -> StoreResult<ItemLedger> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("item_ledger", e))?;

        let item = fetch_item(&mut *tx, item_id)
            .await?
            .ok_or(StoreError::Domain(DomainError::not_found("inventory item")))?;

        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE item_id = ?1 ORDER BY id"
        ))
        .bind(item_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("item_ledger", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("item_ledger", e))?;

        let movements = rows
            .into_iter()
            .map(|r| r.into_movement("item_ledger"))
            .collect::<StoreResult<Vec<_>>>()?;

        let ledger = Ledger::from_parts(&item, movements)
            .map_err(|e| StoreError::corrupt_row("item_ledger", e))?;
        let reconciliation = ledger
            .reconcile()
            .map_err(|e| StoreError::corrupt_row("item_ledger", e))?;
        if !reconciliation.consistent {
            tracing::error!(
                expected = %reconciliation.expected_quantity,
                actual = %reconciliation.actual_quantity,
                "item quantity disagrees with its ledger"
            );
        }

        Ok(ItemLedger {
            movements: ledger.recent_first(),
            reconciliation,
            item,
        })
    }

    /// Compare the stored quantity with opening quantity plus movements.
    pub async fn reconcile(&self, item_id: ItemId) -> StoreResult<Reconciliation> {
        Ok(self.item_ledger(item_id).await?.reconciliation)
    }
}
