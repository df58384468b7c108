//! Calendar dates and inclusive date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("{field} must be a valid YYYY-MM-DD date")))
}

/// Inclusive date range (`start <= date <= end`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("period start must not be after period end"));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> DomainResult<Self> {
        Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
