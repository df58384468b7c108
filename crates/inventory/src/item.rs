use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use textileops_core::{DomainError, DomainResult, ItemId, Money, Units};

const MAX_TEXT_LEN: usize = 200;

/// A stocked material or finished good.
///
/// `quantity` is a projection over the movement ledger: it starts at
/// `opening_quantity` and is only ever changed by recording or deleting
/// movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub unit: String,
    pub opening_quantity: Units,
    pub quantity: Units,
    pub unit_cost: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// On-hand value at unit cost.
    pub fn stock_value(&self) -> DomainResult<Money> {
        self.unit_cost.times(self.quantity)
    }
}

/// Input for item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub code: String,
    pub name: String,
    pub item_type: String,
    pub unit: String,
    pub opening_quantity: Units,
    pub unit_cost: Money,
    pub description: Option<String>,
}

impl NewItem {
    /// Trim text fields and check every field, reporting all problems at once.
    pub fn validated(mut self) -> DomainResult<Self> {
        self.code = self.code.trim().to_string();
        self.name = self.name.trim().to_string();
        self.item_type = self.item_type.trim().to_string();
        self.unit = self.unit.trim().to_string();
        self.description = normalize_optional(self.description);

        let mut errors = Vec::new();
        require_text(&mut errors, "Item code", &self.code);
        require_text(&mut errors, "Item name", &self.name);
        require_text(&mut errors, "Item type", &self.item_type);
        require_text(&mut errors, "Unit", &self.unit);
        if self.opening_quantity.is_negative() {
            errors.push("Opening quantity cannot be negative".to_string());
        } else if !self.opening_quantity.within_limit() {
            errors.push(format!("Opening quantity must be at most {}", Units::LIMIT));
        }
        if self.unit_cost.is_negative() {
            errors.push("Unit cost cannot be negative".to_string());
        }
        DomainError::from_errors(errors)?;
        Ok(self)
    }
}

/// Editable item attributes. Code and quantity are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub name: String,
    pub item_type: String,
    pub unit: String,
    pub unit_cost: Money,
    pub description: Option<String>,
}

impl ItemUpdate {
    pub fn validated(mut self) -> DomainResult<Self> {
        self.name = self.name.trim().to_string();
        self.item_type = self.item_type.trim().to_string();
        self.unit = self.unit.trim().to_string();
        self.description = normalize_optional(self.description);

        let mut errors = Vec::new();
        require_text(&mut errors, "Item name", &self.name);
        require_text(&mut errors, "Item type", &self.item_type);
        require_text(&mut errors, "Unit", &self.unit);
        if self.unit_cost.is_negative() {
            errors.push("Unit cost cannot be negative".to_string());
        }
        DomainError::from_errors(errors)?;
        Ok(self)
    }
}

/// Aggregate figures over the whole stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: i64,
    pub total_quantity: Units,
    pub total_value: Money,
    /// Mean unit cost; 0 when there are no items.
    pub avg_unit_cost: Money,
    pub total_types: i64,
}

impl InventorySummary {
    pub fn from_items(items: &[InventoryItem]) -> DomainResult<Self> {
        let mut total_value = Money::ZERO;
        let mut total_quantity = Units::ZERO;
        let mut types: Vec<&str> = Vec::new();

        for item in items {
            total_value = total_value.checked_add(item.stock_value()?)?;
            total_quantity = total_quantity
                .checked_add(item.quantity)
                .ok_or_else(|| DomainError::validation("total quantity overflow"))?;
            if !types.contains(&item.item_type.as_str()) {
                types.push(&item.item_type);
            }
        }

        Ok(Self {
            total_items: items.len() as i64,
            total_quantity,
            total_value,
            avg_unit_cost: Money::mean(items.iter().map(|item| item.unit_cost)),
            total_types: types.len() as i64,
        })
    }
}

pub(crate) fn require_text(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(format!("{field} is required"));
    } else if value.chars().count() > MAX_TEXT_LEN {
        errors.push(format!("{field} must be at most {MAX_TEXT_LEN} characters"));
    }
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Units {
        s.parse().unwrap()
    }

    fn new_item() -> NewItem {
        NewItem {
            code: " FAB-001 ".to_string(),
            name: "Cotton twill".to_string(),
            item_type: "Fabric".to_string(),
            unit: "m".to_string(),
            opening_quantity: units("100"),
            unit_cost: Money::from_minor(12_000),
            description: Some("   ".to_string()),
        }
    }

    fn item(item_type: &str, quantity: &str, unit_cost: i64) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(1),
            code: "X".to_string(),
            name: "X".to_string(),
            item_type: item_type.to_string(),
            unit: "pcs".to_string(),
            opening_quantity: units(quantity),
            quantity: units(quantity),
            unit_cost: Money::from_minor(unit_cost),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn new_item_is_normalized() {
        let item = new_item().validated().unwrap();
        assert_eq!(item.code, "FAB-001");
        assert_eq!(item.description, None);
    }

    #[test]
    fn new_item_reports_every_problem() {
        let mut bad = new_item();
        bad.code = String::new();
        bad.unit = " ".to_string();
        bad.opening_quantity = units("-1");
        match bad.validated().unwrap_err() {
            DomainError::ValidationErrors(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected ValidationErrors, got {other:?}"),
        }
    }

    #[test]
    fn opening_quantity_is_bounded() {
        let mut big = new_item();
        big.opening_quantity = Units::LIMIT;
        assert!(big.clone().validated().is_ok());
        big.opening_quantity = Units::from_milli(Units::LIMIT.milli() + 1);
        assert!(matches!(big.validated(), Err(DomainError::ValidationErrors(_))));
    }

    #[test]
    fn summary_values_stock_at_unit_cost() {
        let items = vec![
            item("Fabric", "10", 250),
            item("Fabric", "4.5", 100),
            item("Thread", "0", 50),
        ];
        let summary = InventorySummary::from_items(&items).unwrap();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_quantity, units("14.5"));
        assert_eq!(summary.total_value, Money::from_minor(2_950));
        assert_eq!(summary.total_types, 2);
        assert_eq!(summary.avg_unit_cost, Money::from_minor(133));
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = InventorySummary::from_items(&[]).unwrap();
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.total_quantity, Units::ZERO);
        assert_eq!(summary.avg_unit_cost, Money::ZERO);
    }
}
