//! Daily attendance repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::instrument;

use textileops_core::{AttendanceId, DomainError, Period, WorkerId};
use textileops_workforce::{
    AttendanceEntry, AttendanceRecord, AttendanceReportRow, AttendanceStatus, AttendanceTally,
    NewAttendance, Worker,
};

use crate::error::{is_foreign_key_violation, map_sqlx_error, StoreError, StoreResult};
use crate::workers::WorkerRow;

#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: i64,
    worker_id: i64,
    date: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl AttendanceRow {
    fn into_record(self, operation: &'static str) -> StoreResult<AttendanceRecord> {
        let status = self
            .status
            .parse::<AttendanceStatus>()
            .map_err(|e| StoreError::corrupt_row(operation, e))?;
        Ok(AttendanceRecord {
            id: AttendanceId::new(self.id),
            worker_id: WorkerId::new(self.worker_id),
            date: self.date,
            status,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AttendanceEntryRow {
    #[sqlx(flatten)]
    record: AttendanceRow,
    code: String,
    name: String,
    role: String,
}

impl AttendanceEntryRow {
    fn into_entry(self, operation: &'static str) -> StoreResult<AttendanceEntry> {
        Ok(AttendanceEntry {
            record: self.record.into_record(operation)?,
            code: self.code,
            name: self.name,
            role: self.role,
        })
    }
}

#[derive(Debug, FromRow)]
struct TallyRow {
    #[sqlx(flatten)]
    worker: WorkerRow,
    present_days: i64,
    half_days: i64,
    absent_days: i64,
    leave_days: i64,
    total_days: i64,
}

impl TallyRow {
    fn tally(&self) -> AttendanceTally {
        AttendanceTally {
            present_days: self.present_days,
            half_days: self.half_days,
            absent_days: self.absent_days,
            leave_days: self.leave_days,
            total_days: self.total_days,
        }
    }
}

/// Every active worker with their attendance counts inside `period`, ordered
/// by name. Workers with no records in the period get an all-zero tally.
pub(crate) async fn active_worker_tallies<'e, E>(
    executor: E,
    period: Period,
) -> StoreResult<Vec<(Worker, AttendanceTally)>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, TallyRow>(
        r#"
        SELECT w.id, w.code, w.name, w.role, w.contact, w.daily_wage, w.shift_wage,
               w.status, w.created_at, w.updated_at,
               COUNT(CASE WHEN a.status = 'Present' THEN 1 END)  AS present_days,
               COUNT(CASE WHEN a.status = 'Half Day' THEN 1 END) AS half_days,
               COUNT(CASE WHEN a.status = 'Absent' THEN 1 END)   AS absent_days,
               COUNT(CASE WHEN a.status = 'Leave' THEN 1 END)    AS leave_days,
               COUNT(a.id)                                       AS total_days
        FROM workers w
        LEFT JOIN attendance a
               ON a.worker_id = w.id AND a.date BETWEEN ?1 AND ?2
        WHERE w.status = 'active'
        GROUP BY w.id
        ORDER BY w.name, w.id
        "#,
    )
    .bind(period.start())
    .bind(period.end())
    .fetch_all(executor)
    .await
    .map_err(|e| map_sqlx_error("attendance_tallies", e))?;

    rows.into_iter()
        .map(|row| {
            let tally = row.tally();
            Ok((row.worker.into_worker("attendance_tallies")?, tally))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

impl AttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, entry), fields(worker_id = %entry.worker_id, date = %entry.date), err)]
    pub async fn record(&self, entry: NewAttendance) -> StoreResult<AttendanceRecord> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            INSERT INTO attendance (worker_id, date, status, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, worker_id, date, status, notes, created_at
            "#,
        )
        .bind(entry.worker_id.get())
        .bind(entry.date)
        .bind(entry.status.as_str())
        .bind(&entry.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::Domain(DomainError::not_found("worker"))
            } else {
                map_sqlx_error("record_attendance", e)
            }
        })?;

        row.into_record("record_attendance")
    }

    /// Records for one day, joined with the worker, ordered by worker name.
    #[instrument(skip(self), err)]
    pub async fn for_date(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceEntry>> {
        let rows = sqlx::query_as::<_, AttendanceEntryRow>(
            r#"
            SELECT a.id, a.worker_id, a.date, a.status, a.notes, a.created_at,
                   w.code, w.name, w.role
            FROM attendance a
            JOIN workers w ON w.id = a.worker_id
            WHERE a.date = ?1
            ORDER BY w.name, a.id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("attendance_for_date", e))?;

        rows.into_iter().map(|r| r.into_entry("attendance_for_date")).collect()
    }

    /// A worker's history, most recent date first.
    #[instrument(skip(self), fields(worker_id = %worker_id), err)]
    pub async fn for_worker(&self, worker_id: WorkerId) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, worker_id, date, status, notes, created_at
            FROM attendance
            WHERE worker_id = ?1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(worker_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("attendance_for_worker", e))?;

        rows.into_iter().map(|r| r.into_record("attendance_for_worker")).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn report(&self, period: Period) -> StoreResult<Vec<AttendanceReportRow>> {
        let tallies = active_worker_tallies(&self.pool, period).await?;
        Ok(tallies
            .into_iter()
            .map(|(worker, tally)| AttendanceReportRow {
                worker_id: worker.id,
                code: worker.code,
                name: worker.name,
                role: worker.role,
                tally,
            })
            .collect())
    }

    #[instrument(skip(self), fields(attendance_id = %id), err)]
    pub async fn delete(&self, id: AttendanceId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_attendance", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("attendance record").into());
        }
        Ok(())
    }
}
