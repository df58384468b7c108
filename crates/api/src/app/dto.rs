use serde::Deserialize;

use textileops_core::{DomainError, DomainResult, Money, Period, Units};
use textileops_inventory::{ItemUpdate, MovementFilter, NewItem, RecordMovement};
use textileops_workforce::{NewAttendance, NewWorker, WorkerUpdate};

// -------------------------
// Request DTOs
// -------------------------
//
// Money fields are decimal rupees with at most two places; quantities are
// decimal units with at most three. Dates are `YYYY-MM-DD`.

#[derive(Debug, Deserialize)]
pub struct CreateWorkerRequest {
    pub code: String,
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
    pub daily_wage: Money,
    #[serde(default)]
    pub shift_wage: Money,
}

impl From<CreateWorkerRequest> for NewWorker {
    fn from(body: CreateWorkerRequest) -> Self {
        NewWorker {
            code: body.code,
            name: body.name,
            role: body.role,
            contact: body.contact,
            daily_wage: body.daily_wage,
            shift_wage: body.shift_wage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkerRequest {
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
    pub daily_wage: Money,
    #[serde(default)]
    pub shift_wage: Money,
}

impl From<UpdateWorkerRequest> for WorkerUpdate {
    fn from(body: UpdateWorkerRequest) -> Self {
        WorkerUpdate {
            name: body.name,
            role: body.role,
            contact: body.contact,
            daily_wage: body.daily_wage,
            shift_wage: body.shift_wage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordAttendanceRequest {
    pub worker_id: i64,
    pub date: String,
    pub status: String,
    pub notes: Option<String>,
}

impl TryFrom<RecordAttendanceRequest> for NewAttendance {
    type Error = DomainError;

    fn try_from(body: RecordAttendanceRequest) -> DomainResult<Self> {
        NewAttendance::parse(body.worker_id, &body.date, &body.status, body.notes)
    }
}

#[derive(Debug, Deserialize)]
pub struct CalculatePayrollRequest {
    pub start_date: String,
    pub end_date: String,
}

impl CalculatePayrollRequest {
    pub fn period(&self) -> DomainResult<Period> {
        Period::parse(&self.start_date, &self.end_date)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub unit: String,
    /// Opening quantity.
    #[serde(default)]
    pub quantity: Units,
    #[serde(default)]
    pub unit_cost: Money,
    pub description: Option<String>,
}

impl From<CreateItemRequest> for NewItem {
    fn from(body: CreateItemRequest) -> Self {
        NewItem {
            code: body.code,
            name: body.name,
            item_type: body.item_type,
            unit: body.unit,
            opening_quantity: body.quantity,
            unit_cost: body.unit_cost,
            description: body.description,
        }
    }
}

/// Item edit. A `quantity` field, if sent, is ignored: stock only moves
/// through movements.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub unit: String,
    #[serde(default)]
    pub unit_cost: Money,
    pub description: Option<String>,
}

impl From<UpdateItemRequest> for ItemUpdate {
    fn from(body: UpdateItemRequest) -> Self {
        ItemUpdate {
            name: body.name,
            item_type: body.item_type,
            unit: body.unit,
            unit_cost: body.unit_cost,
            description: body.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub item_id: i64,
    pub movement_type: String,
    pub date: String,
    pub quantity: Units,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<RecordMovementRequest> for RecordMovement {
    type Error = DomainError;

    fn try_from(body: RecordMovementRequest) -> DomainResult<Self> {
        RecordMovement::parse(
            body.item_id,
            &body.movement_type,
            &body.date,
            body.quantity,
            body.reference,
            body.notes,
        )
    }
}

/// Query string for `GET /movements`. Values stay raw strings so a bad one
/// produces our own validation error.
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub item_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub movement_type: Option<String>,
}

impl MovementQuery {
    pub fn into_filter(self) -> DomainResult<MovementFilter> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        MovementFilter {
            item_id: non_empty(self.item_id).map(|s| s.parse()).transpose()?,
            from: non_empty(self.from)
                .map(|s| textileops_core::parse_date("from", &s))
                .transpose()?,
            to: non_empty(self.to)
                .map(|s| textileops_core::parse_date("to", &s))
                .transpose()?,
            movement_type: non_empty(self.movement_type).map(|s| s.parse()).transpose()?,
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use textileops_core::ItemId;
    use textileops_inventory::MovementType;

    use super::*;

    #[test]
    fn movement_query_parses_every_field() {
        let filter = MovementQuery {
            item_id: Some("7".into()),
            from: Some("2024-01-01".into()),
            to: Some("2024-01-31".into()),
            movement_type: Some("OUTWARD".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.item_id, Some(ItemId::new(7)));
        assert_eq!(filter.movement_type, Some(MovementType::Outward));
    }

    #[test]
    fn movement_query_rejects_reversed_range_and_bad_ids() {
        let reversed = MovementQuery {
            from: Some("2024-02-01".into()),
            to: Some("2024-01-01".into()),
            ..MovementQuery::default()
        };
        assert!(reversed.into_filter().is_err());

        let bad_id = MovementQuery {
            item_id: Some("abc".into()),
            ..MovementQuery::default()
        };
        assert!(matches!(bad_id.into_filter(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn fractional_quantities_and_costs_are_accepted() {
        let body: RecordMovementRequest = serde_json::from_value(serde_json::json!({
            "item_id": 4,
            "movement_type": "Outward",
            "date": "2024-03-01",
            "quantity": 2.5
        }))
        .unwrap();
        let cmd = RecordMovement::try_from(body).unwrap();
        assert_eq!(cmd.quantity.get(), Units::from_milli(2_500));

        let item: CreateItemRequest = serde_json::from_value(serde_json::json!({
            "code": "FAB-9",
            "name": "Linen",
            "type": "Fabric",
            "unit": "m",
            "quantity": 12.75,
            "unit_cost": 450.5
        }))
        .unwrap();
        let item = NewItem::from(item);
        assert_eq!(item.opening_quantity, Units::from_milli(12_750));
        assert_eq!(item.unit_cost, Money::from_minor(45_050));
    }

    #[test]
    fn blank_query_values_are_ignored() {
        let filter = MovementQuery {
            movement_type: Some(String::new()),
            ..MovementQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter, MovementFilter::default());
    }
}
