//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}
