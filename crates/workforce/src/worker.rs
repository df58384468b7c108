use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use textileops_core::{DomainError, DomainResult, Money, WorkerId};

/// Suggested role categories for the workshop floor.
pub const ROLE_CATEGORIES: [&str; 6] = [
    "Tailor",
    "Cutter",
    "Helper",
    "Machine Operator",
    "Packer",
    "Supervisor",
];

/// Employment status. Deleting a worker only marks them inactive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Active,
    Inactive,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Active => "active",
            WorkerStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for WorkerStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WorkerStatus::Active),
            "inactive" => Ok(WorkerStatus::Inactive),
            other => Err(DomainError::validation(format!("unknown worker status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub code: String,
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
    pub daily_wage: Money,
    pub shift_wage: Money,
    pub status: WorkerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    pub fn is_active(&self) -> bool {
        self.status == WorkerStatus::Active
    }
}

/// Input for registering a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorker {
    pub code: String,
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
    pub daily_wage: Money,
    pub shift_wage: Money,
}

impl NewWorker {
    pub fn validated(mut self) -> DomainResult<Self> {
        self.code = self.code.trim().to_string();
        let mut errors = Vec::new();
        if self.code.is_empty() {
            errors.push("Employee code is required".to_string());
        }
        let update = WorkerUpdate {
            name: self.name,
            role: self.role,
            contact: self.contact,
            daily_wage: self.daily_wage,
            shift_wage: self.shift_wage,
        };
        let update = update.check(&mut errors);
        DomainError::from_errors(errors)?;
        Ok(Self {
            code: self.code,
            name: update.name,
            role: update.role,
            contact: update.contact,
            daily_wage: update.daily_wage,
            shift_wage: update.shift_wage,
        })
    }
}

/// Editable worker attributes; the employee code is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerUpdate {
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
    pub daily_wage: Money,
    pub shift_wage: Money,
}

impl WorkerUpdate {
    pub fn validated(self) -> DomainResult<Self> {
        let mut errors = Vec::new();
        let update = self.check(&mut errors);
        DomainError::from_errors(errors)?;
        Ok(update)
    }

    fn check(mut self, errors: &mut Vec<String>) -> Self {
        self.name = self.name.trim().to_string();
        self.role = self.role.trim().to_string();
        self.contact = self
            .contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if self.name.is_empty() {
            errors.push("Worker name is required".to_string());
        }
        if self.role.is_empty() {
            errors.push("Worker role is required".to_string());
        }
        if !self.daily_wage.is_positive() {
            errors.push("Daily wage must be greater than 0".to_string());
        }
        if self.shift_wage.is_negative() {
            errors.push("Shift wage cannot be negative".to_string());
        }
        self
    }
}

/// Headcount and wage figures over active workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub total_workers: i64,
    /// Mean daily wage; 0 when nobody is active.
    pub avg_daily_wage: Money,
    pub total_daily_wages: Money,
}

impl WorkerStats {
    pub fn from_workers<'a>(workers: impl IntoIterator<Item = &'a Worker>) -> DomainResult<Self> {
        let wages: Vec<Money> = workers
            .into_iter()
            .filter(|w| w.is_active())
            .map(|w| w.daily_wage)
            .collect();
        let mut total = Money::ZERO;
        for wage in &wages {
            total = total.checked_add(*wage)?;
        }
        Ok(Self {
            total_workers: wages.len() as i64,
            avg_daily_wage: Money::mean(wages),
            total_daily_wages: total,
        })
    }
}
