//! Payroll calculation and history.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use textileops_core::{Money, PayrollId, Period, WorkerId};
use textileops_workforce::{AttendanceTally, PayrollLine, PayrollRecord, PayrollRun, PayrollSummary};

use crate::attendance::active_worker_tallies;
use crate::error::{map_sqlx_error, StoreResult};

const RECORD_SELECT: &str = r#"
    SELECT p.id, p.worker_id, w.code, w.name, w.role, p.period_start, p.period_end,
           p.full_days, p.half_days, p.wage_amount, p.status, p.created_at
    FROM payroll p
    JOIN workers w ON w.id = p.worker_id
"#;

#[derive(Debug, FromRow)]
struct PayrollRow {
    id: i64,
    worker_id: i64,
    code: String,
    name: String,
    role: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    full_days: i64,
    half_days: i64,
    wage_amount: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<PayrollRow> for PayrollRecord {
    fn from(row: PayrollRow) -> Self {
        let tally = AttendanceTally {
            present_days: row.full_days,
            half_days: row.half_days,
            ..AttendanceTally::default()
        };
        PayrollRecord {
            id: PayrollId::new(row.id),
            worker_id: WorkerId::new(row.worker_id),
            code: row.code,
            name: row.name,
            role: row.role,
            period_start: row.period_start,
            period_end: row.period_end,
            full_days: row.full_days,
            half_days: row.half_days,
            days_worked: tally.days_worked(),
            wage_amount: Money::from_minor(row.wage_amount),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: SqlitePool,
}

impl PayrollRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Computes wages for every active worker over `period` and stores a
    /// record for each worker with at least one paid day. The inserts share
    /// one transaction.
    #[instrument(skip(self), err)]
    pub async fn calculate(&self, period: Period) -> StoreResult<PayrollRun> {
        let tallies = active_worker_tallies(&self.pool, period).await?;
        let lines = tallies
            .iter()
            .map(|(worker, tally)| PayrollLine::compute(worker, tally))
            .collect::<Result<Vec<_>, _>>()?;

        let payable: Vec<&PayrollLine> = lines.iter().filter(|l| l.is_payable()).collect();
        let stored = payable.len();
        if !payable.is_empty() {
            let now = Utc::now();
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("calculate_payroll", e))?;

            for line in &payable {
                sqlx::query(
                    r#"
                    INSERT INTO payroll (worker_id, period_start, period_end, full_days, half_days, wage_amount, status, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'calculated', ?7)
                    "#,
                )
                .bind(line.worker_id.get())
                .bind(period.start())
                .bind(period.end())
                .bind(line.full_days)
                .bind(line.half_days)
                .bind(line.total_wages.minor())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("calculate_payroll", e))?;
            }

            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("calculate_payroll", e))?;
        }

        let run = PayrollRun::new(period, lines)?;
        tracing::info!(
            workers = run.total_workers,
            stored,
            total_payroll = %run.total_payroll,
            "payroll calculated"
        );
        Ok(run)
    }

    /// All stored records, newest first.
    #[instrument(skip(self), err)]
    pub async fn list(&self) -> StoreResult<Vec<PayrollRecord>> {
        let rows = sqlx::query_as::<_, PayrollRow>(&format!(
            "{RECORD_SELECT} ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_payroll", e))?;

        Ok(rows.into_iter().map(PayrollRecord::from).collect())
    }

    /// Records stored for exactly this period, ordered by worker name.
    #[instrument(skip(self), err)]
    pub async fn for_period(&self, period: Period) -> StoreResult<PayrollSummary> {
        let rows = sqlx::query_as::<_, PayrollRow>(&format!(
            "{RECORD_SELECT} WHERE p.period_start = ?1 AND p.period_end = ?2 ORDER BY w.name, p.id"
        ))
        .bind(period.start())
        .bind(period.end())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payroll_for_period", e))?;

        Ok(PayrollSummary::from_records(
            rows.into_iter().map(PayrollRecord::from).collect(),
        )?)
    }

    #[instrument(skip(self), fields(worker_id = %worker_id), err)]
    pub async fn for_worker(&self, worker_id: WorkerId) -> StoreResult<Vec<PayrollRecord>> {
        let rows = sqlx::query_as::<_, PayrollRow>(&format!(
            "{RECORD_SELECT} WHERE p.worker_id = ?1 ORDER BY p.period_start DESC, p.id DESC"
        ))
        .bind(worker_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payroll_for_worker", e))?;

        Ok(rows.into_iter().map(PayrollRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use textileops_workforce::{NewAttendance, NewWorker};

    use super::*;
    use crate::attendance::AttendanceRepository;
    use crate::db::{connect, DbConfig};
    use crate::workers::WorkerRepository;

    #[tokio::test]
    async fn calculate_stores_only_workers_with_paid_days() {
        let pool = connect(&DbConfig::in_memory()).await.unwrap();
        let workers = WorkerRepository::new(pool.clone());
        let attendance = AttendanceRepository::new(pool.clone());
        let payroll = PayrollRepository::new(pool);

        let mut hired = Vec::new();
        for (code, name, wage) in [("E1", "Bina", 60_001), ("E2", "Chetan", 40_000)] {
            hired.push(
                workers
                    .create(NewWorker {
                        code: code.to_string(),
                        name: name.to_string(),
                        role: "Tailor".to_string(),
                        contact: None,
                        daily_wage: Money::from_minor(wage),
                        shift_wage: Money::ZERO,
                    })
                    .await
                    .unwrap(),
            );
        }
        let bina = &hired[0];
        for (date, status) in [("2024-05-01", "Present"), ("2024-05-02", "Present"), ("2024-05-03", "Half Day")] {
            attendance
                .record(NewAttendance::parse(bina.id.get(), date, status, None).unwrap())
                .await
                .unwrap();
        }
        attendance
            .record(NewAttendance::parse(hired[1].id.get(), "2024-05-01", "Absent", None).unwrap())
            .await
            .unwrap();

        let period = Period::parse("2024-05-01", "2024-05-31").unwrap();
        let run = payroll.calculate(period).await.unwrap();

        assert_eq!(run.total_workers, 2);
        // 2 x 60001 + floor(60001 / 2)
        assert_eq!(run.workers[0].total_wages, Money::from_minor(150_002));
        assert_eq!(run.workers[1].total_wages, Money::ZERO);
        assert_eq!(run.total_payroll, Money::from_minor(150_002));

        let summary = payroll.for_period(period).await.unwrap();
        assert_eq!(summary.total_workers, 1);
        assert_eq!(summary.records[0].days_worked, 2.5);
        assert_eq!(summary.records[0].status, "calculated");

        assert_eq!(payroll.for_worker(bina.id).await.unwrap().len(), 1);
        assert!(payroll.for_worker(hired[1].id).await.unwrap().is_empty());
        assert_eq!(payroll.list().await.unwrap().len(), 1);
    }
}
