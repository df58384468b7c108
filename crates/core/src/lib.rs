//! `textileops-core`: identifiers, quantities, money, date periods and the
//! shared domain error type. No IO.

pub mod error;
pub mod id;
pub mod period;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{AttendanceId, ItemId, MovementId, PayrollId, WorkerId};
pub use period::{parse_date, Period};
pub use value_object::{Money, Quantity, Units};
