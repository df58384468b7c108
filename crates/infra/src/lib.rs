//! Infrastructure layer: SQLite persistence for the workshop tracker.
//!
//! Every repository holds a shared [`sqlx::SqlitePool`]; nothing caches
//! stored values between calls.

pub mod attendance;
pub mod db;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod payroll;
pub mod workers;

pub use db::{connect, DbConfig};
pub use error::{StoreError, StoreResult};
pub use ledger::StockLedger;
