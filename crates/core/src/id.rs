//! Strongly-typed identifiers used across the domain.
//!
//! All ids are assigned by the relational store (`INTEGER PRIMARY KEY`), so
//! they are integer newtypes rather than generated UUIDs.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an inventory item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

/// Identifier of a stock movement. Assignment order equals recording order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(i64);

/// Identifier of a worker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(i64);

/// Identifier of an attendance record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceId(i64);

/// Identifier of a payroll record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayrollId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                if raw <= 0 {
                    return Err(DomainError::invalid_id(format!("{}: must be positive", $name)));
                }
                Ok(Self(raw))
            }
        }
    };
}

impl_int_newtype!(ItemId, "ItemId");
impl_int_newtype!(MovementId, "MovementId");
impl_int_newtype!(WorkerId, "WorkerId");
impl_int_newtype!(AttendanceId, "AttendanceId");
impl_int_newtype!(PayrollId, "PayrollId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_integers() {
        let id: MovementId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_garbage_and_non_positive() {
        assert!(matches!("abc".parse::<ItemId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("0".parse::<ItemId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("-3".parse::<WorkerId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&ItemId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
