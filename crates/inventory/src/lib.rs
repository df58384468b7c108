//! Inventory domain module.
//!
//! This crate contains business rules for stock items and the movement
//! ledger, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage). The storage layer applies these rules inside transactions.

pub mod item;
pub mod ledger;
pub mod movement;

pub use item::{InventoryItem, InventorySummary, ItemUpdate, NewItem};
pub use ledger::{Ledger, Reconciliation};
pub use movement::{
    MovementFilter, MovementType, NegativeStockPolicy, RecordMovement, StockMovement,
    StockWarning,
};
