use textileops_infra::attendance::AttendanceRepository;
use textileops_infra::inventory::ItemRepository;
use textileops_infra::payroll::PayrollRepository;
use textileops_infra::workers::WorkerRepository;
use textileops_infra::{connect, StockLedger, StoreResult};

use crate::config::AppConfig;

/// Everything handlers need, shared behind an `Arc` as a request extension.
///
/// All repositories share one connection pool; none of them caches data.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub items: ItemRepository,
    pub ledger: StockLedger,
    pub workers: WorkerRepository,
    pub attendance: AttendanceRepository,
    pub payroll: PayrollRepository,
}

/// Connect to the database (running migrations) and wire the repositories.
pub async fn build_services(config: &AppConfig) -> StoreResult<AppServices> {
    let pool = connect(&config.database).await?;

    tracing::info!(
        policy = ?config.negative_stock_policy,
        max_connections = config.database.max_connections,
        "services ready"
    );

    Ok(AppServices {
        items: ItemRepository::new(pool.clone()),
        ledger: StockLedger::new(pool.clone(), config.negative_stock_policy),
        workers: WorkerRepository::new(pool.clone()),
        attendance: AttendanceRepository::new(pool.clone()),
        payroll: PayrollRepository::new(pool),
    })
}
