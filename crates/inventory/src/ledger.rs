//! Ledger arithmetic: an item's quantity as a projection over its movements.

use serde::{Deserialize, Serialize};

use textileops_core::{DomainError, DomainResult, ItemId, Units};

use crate::item::InventoryItem;
use crate::movement::StockMovement;

/// Result of checking an item's stored quantity against its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub item_id: ItemId,
    pub opening_quantity: Units,
    /// Signed sum of all recorded movements.
    pub movement_total: Units,
    pub expected_quantity: Units,
    pub actual_quantity: Units,
    pub consistent: bool,
}

impl Reconciliation {
    /// `deltas` are the signed adjustments of the surviving movements.
    ///
    /// Sums in `i128`: a running total can leave the `i64` range even when
    /// the final figure fits.
    pub fn compute(
        item_id: ItemId,
        opening_quantity: Units,
        actual_quantity: Units,
        deltas: impl IntoIterator<Item = Units>,
    ) -> DomainResult<Self> {
        let total: i128 = deltas.into_iter().map(|d| i128::from(d.milli())).sum();
        let expected = i128::from(opening_quantity.milli()) + total;

        let out_of_range = || {
            DomainError::validation(format!(
                "movement total for item {item_id} is out of range"
            ))
        };
        let movement_total = i64::try_from(total).map_err(|_| out_of_range())?;
        let expected_quantity = i64::try_from(expected).map_err(|_| out_of_range())?;

        Ok(Self {
            item_id,
            opening_quantity,
            movement_total: Units::from_milli(movement_total),
            expected_quantity: Units::from_milli(expected_quantity),
            actual_quantity,
            consistent: expected == i128::from(actual_quantity.milli()),
        })
    }
}

/// One item's stored movements together with its stored quantity.
///
/// Entries are kept in recording order (ascending movement id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    item_id: ItemId,
    opening_quantity: Units,
    quantity: Units,
    entries: Vec<StockMovement>,
}

impl Ledger {
    /// Assemble a ledger from a stored item and its stored movements.
    ///
    /// The stored quantity is taken as-is; use [`Ledger::reconcile`] to check it.
    pub fn from_parts(item: &InventoryItem, movements: Vec<StockMovement>) -> DomainResult<Self> {
        if let Some(stray) = movements.iter().find(|m| m.item_id != item.id) {
            return Err(DomainError::validation(format!(
                "movement {} belongs to item {}, not {}",
                stray.id, stray.item_id, item.id
            )));
        }
        let mut entries = movements;
        entries.sort_by_key(|m| m.id);
        Ok(Self {
            item_id: item.id,
            opening_quantity: item.opening_quantity,
            quantity: item.quantity,
            entries,
        })
    }

    /// Movements ordered most recent first (date, then recording order).
    pub fn recent_first(&self) -> Vec<StockMovement> {
        let mut out = self.entries.clone();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        out
    }

    pub fn reconcile(&self) -> DomainResult<Reconciliation> {
        Reconciliation::compute(
            self.item_id,
            self.opening_quantity,
            self.quantity,
            self.entries.iter().map(StockMovement::signed_delta),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use textileops_core::{Money, MovementId, Quantity};

    use super::*;
    use crate::movement::MovementType;

    fn item_id() -> ItemId {
        ItemId::new(1)
    }

    fn movement(id: i64, movement_type: MovementType, milli: i64) -> StockMovement {
        StockMovement {
            id: MovementId::new(id),
            item_id: item_id(),
            movement_type,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(id as u64 % 28),
            quantity: Quantity::new(Units::from_milli(milli)).unwrap(),
            reference: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn stored_item(opening: i64, quantity: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: item_id(),
            code: "T-1".into(),
            name: "Thread".into(),
            item_type: "Trim".into(),
            unit: "spool".into(),
            opening_quantity: Units::from_milli(opening),
            quantity: Units::from_milli(quantity),
            unit_cost: Money::from_minor(100),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn consistent_ledger_with_fractional_movements() {
        let movements = vec![
            movement(1, MovementType::Inward, 50_000),
            movement(2, MovementType::Outward, 2_750),
        ];
        let ledger = Ledger::from_parts(&stored_item(100_000, 147_250), movements).unwrap();
        let rec = ledger.reconcile().unwrap();
        assert_eq!(rec.movement_total, Units::from_milli(47_250));
        assert_eq!(rec.expected_quantity, Units::from_milli(147_250));
        assert!(rec.consistent);
    }

    #[test]
    fn reconciliation_detects_drift() {
        let ledger =
            Ledger::from_parts(&stored_item(5_000, 0), vec![movement(1, MovementType::Inward, 3_000)])
                .unwrap();
        let rec = ledger.reconcile().unwrap();
        assert_eq!(rec.expected_quantity, Units::from_milli(8_000));
        assert_eq!(rec.actual_quantity, Units::ZERO);
        assert!(!rec.consistent);
    }

    #[test]
    fn large_running_totals_do_not_overflow() {
        // Partial sums pass i64::MAX; the final total does not.
        let big = Units::from_milli(i64::MAX - 10);
        let rec = Reconciliation::compute(item_id(), Units::ZERO, big, [big, big, -big]).unwrap();
        assert_eq!(rec.movement_total, big);
        assert!(rec.consistent);
    }

    #[test]
    fn totals_outside_i64_are_reported() {
        let big = Units::from_milli(i64::MAX - 10);
        let err = Reconciliation::compute(item_id(), Units::ZERO, Units::ZERO, [big, big])
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn stray_movements_are_refused() {
        let mut stray = movement(1, MovementType::Inward, 1_000);
        stray.item_id = ItemId::new(2);
        assert!(Ledger::from_parts(&stored_item(0, 0), vec![stray]).is_err());
    }

    #[test]
    fn recent_first_orders_by_date_then_id() {
        let movements = (1..=3).rev().map(|id| movement(id, MovementType::Inward, 1_000)).collect();
        let ledger = Ledger::from_parts(&stored_item(0, 3_000), movements).unwrap();
        let ids: Vec<i64> = ledger.recent_first().iter().map(|m| m.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
