use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use textileops_core::{parse_date, DomainError, DomainResult, ItemId, MovementId, Quantity, Units};

use crate::item::normalize_optional;

const MAX_REFERENCE_LEN: usize = 100;
const MAX_NOTES_LEN: usize = 1000;

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    /// Receipt: increases on-hand quantity.
    Inward,
    /// Issue/consumption: decreases on-hand quantity.
    Outward,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::Inward => "Inward",
            MovementType::Outward => "Outward",
        }
    }

    /// Signed effect of a movement of this type on on-hand quantity.
    pub fn signed(self, quantity: Quantity) -> Units {
        match self {
            MovementType::Inward => quantity.get(),
            MovementType::Outward => -quantity.get(),
        }
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inward" => Ok(MovementType::Inward),
            "outward" => Ok(MovementType::Outward),
            _ => Err(DomainError::validation(
                "movement_type must be one of: Inward, Outward",
            )),
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded entry in the movement ledger. Never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub movement_type: MovementType,
    pub date: NaiveDate,
    pub quantity: Quantity,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Adjustment this movement applied to its item when recorded.
    pub fn signed_delta(&self) -> Units {
        self.movement_type.signed(self.quantity)
    }

    /// Adjustment that undoes this movement when it is deleted.
    pub fn compensation(&self) -> Units {
        -self.signed_delta()
    }
}

/// Command: record a movement against an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovement {
    pub item_id: ItemId,
    pub movement_type: MovementType,
    pub date: NaiveDate,
    pub quantity: Quantity,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl RecordMovement {
    /// Build the command from raw boundary input, reporting every invalid field.
    pub fn parse(
        item_id: i64,
        movement_type: &str,
        date: &str,
        quantity: Units,
        reference: Option<String>,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        let mut errors = Vec::new();

        if item_id <= 0 {
            errors.push("item_id must be a positive integer".to_string());
        }
        let movement_type = movement_type
            .parse::<MovementType>()
            .map_err(|e| errors.push(message_of(e)))
            .ok();
        let date = parse_date("date", date)
            .map_err(|e| errors.push(message_of(e)))
            .ok();
        let quantity = Quantity::new(quantity)
            .map_err(|e| errors.push(message_of(e)))
            .ok();

        let reference = normalize_optional(reference);
        if reference.as_ref().is_some_and(|r| r.chars().count() > MAX_REFERENCE_LEN) {
            errors.push(format!("reference must be at most {MAX_REFERENCE_LEN} characters"));
        }
        let notes = normalize_optional(notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            errors.push(format!("notes must be at most {MAX_NOTES_LEN} characters"));
        }

        match (movement_type, date, quantity) {
            (Some(movement_type), Some(date), Some(quantity)) if errors.is_empty() => Ok(Self {
                item_id: ItemId::new(item_id),
                movement_type,
                date,
                quantity,
                reference,
                notes,
            }),
            _ => Err(match errors.len() {
                1 => DomainError::Validation(errors.remove(0)),
                _ => DomainError::ValidationErrors(errors),
            }),
        }
    }

    pub fn signed_delta(&self) -> Units {
        self.movement_type.signed(self.quantity)
    }
}

fn message_of(err: DomainError) -> String {
    match err {
        DomainError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

/// Non-fatal signal returned alongside a successful ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    /// The adjustment left the item with negative on-hand stock.
    NegativeStock { item_id: ItemId, resulting_quantity: Units },
}

impl core::fmt::Display for StockWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StockWarning::NegativeStock {
                item_id,
                resulting_quantity,
            } => write!(
                f,
                "item {item_id} is now below zero stock ({resulting_quantity})"
            ),
        }
    }
}

/// What to do when an adjustment would take on-hand stock below zero.
///
/// Either way the ledger and the item quantity stay exactly reconciled:
/// quantities are never clamped.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStockPolicy {
    /// Apply the adjustment and return a [`StockWarning`].
    #[default]
    Allow,
    /// Refuse the adjustment with [`DomainError::InsufficientStock`].
    Reject,
}

impl NegativeStockPolicy {
    /// Judge an adjustment of `delta` applied to `previous` on-hand stock.
    ///
    /// Only adjustments that decrease stock and end below zero are affected;
    /// an increase never fails even if the item is already negative.
    pub fn evaluate(
        self,
        item_id: ItemId,
        previous: Units,
        delta: Units,
    ) -> DomainResult<Option<StockWarning>> {
        let resulting = previous.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!("stock for item {item_id} is out of range"))
        })?;
        if !delta.is_negative() || !resulting.is_negative() {
            return Ok(None);
        }
        match self {
            NegativeStockPolicy::Allow => Ok(Some(StockWarning::NegativeStock {
                item_id,
                resulting_quantity: resulting,
            })),
            NegativeStockPolicy::Reject => Err(DomainError::InsufficientStock {
                item_id: item_id.get(),
                on_hand: previous,
                requested: -delta,
            }),
        }
    }
}

impl FromStr for NegativeStockPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(NegativeStockPolicy::Allow),
            "reject" => Ok(NegativeStockPolicy::Reject),
            other => Err(DomainError::validation(format!(
                "unknown negative stock policy '{other}' (expected allow or reject)"
            ))),
        }
    }
}

/// Filter for movement listings. All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub item_id: Option<ItemId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub movement_type: Option<MovementType>,
}

impl MovementFilter {
    pub fn validated(self) -> DomainResult<Self> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::validation("from must not be after to"));
            }
        }
        Ok(self)
    }
}
