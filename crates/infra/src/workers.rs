//! Worker registry repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use textileops_core::{DomainError, Money, WorkerId};
use textileops_workforce::{NewWorker, Worker, WorkerStats, WorkerStatus, WorkerUpdate};

use crate::error::{is_unique_violation, map_sqlx_error, StoreError, StoreResult};

pub(crate) const WORKER_COLUMNS: &str =
    "id, code, name, role, contact, daily_wage, shift_wage, status, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct WorkerRow {
    id: i64,
    code: String,
    name: String,
    role: String,
    contact: Option<String>,
    daily_wage: i64,
    shift_wage: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkerRow {
    pub(crate) fn into_worker(self, operation: &'static str) -> StoreResult<Worker> {
        let status = self
            .status
            .parse::<WorkerStatus>()
            .map_err(|e| StoreError::corrupt_row(operation, e))?;
        Ok(Worker {
            id: WorkerId::new(self.id),
            code: self.code,
            name: self.name,
            role: self.role,
            contact: self.contact,
            daily_wage: Money::from_minor(self.daily_wage),
            shift_wage: Money::from_minor(self.shift_wage),
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorkerRepository {
    pool: SqlitePool,
}

impl WorkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, new_worker), fields(code = %new_worker.code), err)]
    pub async fn create(&self, new_worker: NewWorker) -> StoreResult<Worker> {
        let worker = new_worker.validated()?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, WorkerRow>(&format!(
            r#"
            INSERT INTO workers (code, name, role, contact, daily_wage, shift_wage, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7, ?7)
            RETURNING {WORKER_COLUMNS}
            "#
        ))
        .bind(&worker.code)
        .bind(&worker.name)
        .bind(&worker.role)
        .bind(&worker.contact)
        .bind(worker.daily_wage.minor())
        .bind(worker.shift_wage.minor())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Domain(DomainError::conflict(format!(
                    "Worker code '{}' already exists",
                    worker.code
                )))
            } else {
                map_sqlx_error("create_worker", e)
            }
        })?;

        row.into_worker("create_worker")
    }

    /// Active workers, ordered by name.
    #[instrument(skip(self), err)]
    pub async fn list_active(&self) -> StoreResult<Vec<Worker>> {
        let rows = sqlx::query_as::<_, WorkerRow>(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE status = 'active' ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_workers", e))?;

        rows.into_iter().map(|r| r.into_worker("list_workers")).collect()
    }

    #[instrument(skip(self), fields(worker_id = %id), err)]
    pub async fn get(&self, id: WorkerId) -> StoreResult<Worker> {
        let row = sqlx::query_as::<_, WorkerRow>(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_worker", e))?;

        row.ok_or(StoreError::Domain(DomainError::not_found("worker")))?
            .into_worker("get_worker")
    }

    #[instrument(skip(self, update), fields(worker_id = %id), err)]
    pub async fn update(&self, id: WorkerId, update: WorkerUpdate) -> StoreResult<Worker> {
        let update = update.validated()?;

        let row = sqlx::query_as::<_, WorkerRow>(&format!(
            r#"
            UPDATE workers
            SET name = ?1, role = ?2, contact = ?3, daily_wage = ?4, shift_wage = ?5, updated_at = ?6
            WHERE id = ?7
            RETURNING {WORKER_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(&update.role)
        .bind(&update.contact)
        .bind(update.daily_wage.minor())
        .bind(update.shift_wage.minor())
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_worker", e))?;

        row.ok_or(StoreError::Domain(DomainError::not_found("worker")))?
            .into_worker("update_worker")
    }

    /// Soft delete: the worker is marked inactive and keeps their history.
    #[instrument(skip(self), fields(worker_id = %id), err)]
    pub async fn deactivate(&self, id: WorkerId) -> StoreResult<()> {
        let result = sqlx::query("UPDATE workers SET status = 'inactive', updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_worker", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("worker").into());
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&self) -> StoreResult<WorkerStats> {
        let workers = self.list_active().await?;
        Ok(WorkerStats::from_workers(&workers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, DbConfig};

    fn new_worker(code: &str, name: &str, wage: i64) -> NewWorker {
        NewWorker {
            code: code.to_string(),
            name: name.to_string(),
            role: "Tailor".to_string(),
            contact: None,
            daily_wage: Money::from_minor(wage),
            shift_wage: Money::ZERO,
        }
    }

    #[tokio::test]
    async fn soft_delete_hides_worker_from_active_list() {
        let repo = WorkerRepository::new(connect(&DbConfig::in_memory()).await.unwrap());
        let a = repo.create(new_worker("E1", "Meena", 50_000)).await.unwrap();
        repo.create(new_worker("E2", "Arjun", 70_000)).await.unwrap();

        repo.deactivate(a.id).await.unwrap();

        let names: Vec<String> = repo.list_active().await.unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Arjun"]);
        assert_eq!(repo.get(a.id).await.unwrap().status, WorkerStatus::Inactive);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_workers, 1);
        assert_eq!(stats.total_daily_wages, Money::from_minor(70_000));
    }

    #[tokio::test]
    async fn duplicate_code_and_invalid_input_are_rejected() {
        let repo = WorkerRepository::new(connect(&DbConfig::in_memory()).await.unwrap());
        repo.create(new_worker("E1", "Meena", 50_000)).await.unwrap();

        let dup = repo.create(new_worker("E1", "Other", 10)).await.unwrap_err();
        assert!(matches!(dup, StoreError::Domain(DomainError::Conflict(_))));

        let invalid = repo.create(new_worker("E3", "", 0)).await.unwrap_err();
        assert!(matches!(invalid, StoreError::Domain(DomainError::ValidationErrors(_))));
    }

    #[tokio::test]
    async fn update_keeps_code() {
        let repo = WorkerRepository::new(connect(&DbConfig::in_memory()).await.unwrap());
        let w = repo.create(new_worker("E9", "Kiran", 40_000)).await.unwrap();
        let updated = repo
            .update(
                w.id,
                WorkerUpdate {
                    name: "Kiran S".to_string(),
                    role: "Supervisor".to_string(),
                    contact: Some("98450 00000".to_string()),
                    daily_wage: Money::from_minor(80_000),
                    shift_wage: Money::from_minor(5_000),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.code, "E9");
        assert_eq!(updated.role, "Supervisor");

        let missing = repo.deactivate(WorkerId::new(404)).await.unwrap_err();
        assert_eq!(missing.as_domain(), Some(&DomainError::NotFound("worker")));
    }
}
