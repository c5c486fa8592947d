//! PostgreSQL 저장소.
//!
//! # 주요 기능
//! - 스키마 생성 (`assessment_jobs`, `migration_plans`)
//! - 계획/작업 단건 upsert 및 조회

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relocator_core::{
    AssessmentJob, AssessmentStore, ExecutionLog, InventorySnapshot, MigrationPlan, PlanStore,
    StoreError,
};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

// ================================================================================================
// Rows
// ================================================================================================

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    job_id: Uuid,
    subscription_id: String,
    source_group: String,
    target_group_id: String,
    batch: JsonValue,
    status: String,
    execution_log: Option<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for MigrationPlan {
    type Error = StoreError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::Corrupt)?;
        let batch: Vec<String> = serde_json::from_value(row.batch)?;
        let execution_log: Option<ExecutionLog> =
            row.execution_log.map(serde_json::from_value).transpose()?;

        Ok(MigrationPlan {
            id: row.id,
            job_id: row.job_id,
            subscription_id: row.subscription_id,
            source_group: row.source_group,
            target_group_id: row.target_group_id,
            batch,
            status,
            execution_log,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    tenant_id: String,
    subscription_id: String,
    status: String,
    inventory_snapshot: Option<JsonValue>,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for AssessmentJob {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::Corrupt)?;
        let inventory_snapshot: Option<InventorySnapshot> = row
            .inventory_snapshot
            .map(serde_json::from_value)
            .transpose()?;

        Ok(AssessmentJob {
            id: row.id,
            tenant_id: row.tenant_id,
            subscription_id: row.subscription_id,
            status,
            inventory_snapshot,
            error: row.error,
            created_at: row.created_at,
        })
    }
}

// ================================================================================================
// Store
// ================================================================================================

/// sqlx 기반 계획/작업 저장소.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 풀 생성.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        info!(max_connections, "PostgreSQL 연결 풀 생성");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(backend)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 테이블이 없으면 생성.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assessment_jobs (
                id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                subscription_id TEXT NOT NULL,
                status TEXT NOT NULL,
                inventory_snapshot JSONB,
                error TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migration_plans (
                id UUID PRIMARY KEY,
                job_id UUID NOT NULL REFERENCES assessment_jobs(id),
                subscription_id TEXT NOT NULL,
                source_group TEXT NOT NULL,
                target_group_id TEXT NOT NULL,
                batch JSONB NOT NULL,
                status TEXT NOT NULL,
                execution_log JSONB,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        debug!("스키마 확인 완료");
        Ok(())
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<MigrationPlan>, StoreError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, job_id, subscription_id, source_group, target_group_id,
                   batch, status, execution_log, created_at, updated_at
            FROM migration_plans
            WHERE id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(MigrationPlan::try_from).transpose()
    }

    async fn save_plan(&self, plan: &MigrationPlan) -> Result<(), StoreError> {
        let batch = serde_json::to_value(&plan.batch)?;
        let execution_log = plan
            .execution_log
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO migration_plans (
                id, job_id, subscription_id, source_group, target_group_id,
                batch, status, execution_log, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                execution_log = EXCLUDED.execution_log,
                batch = EXCLUDED.batch,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(plan.id)
        .bind(plan.job_id)
        .bind(&plan.subscription_id)
        .bind(&plan.source_group)
        .bind(&plan.target_group_id)
        .bind(&batch)
        .bind(plan.status.as_str())
        .bind(&execution_log)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        debug!(plan_id = %plan.id, status = %plan.status, "계획 저장");
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn load_job(&self, job_id: Uuid) -> Result<Option<AssessmentJob>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, tenant_id, subscription_id, status, inventory_snapshot, error, created_at
            FROM assessment_jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(AssessmentJob::try_from).transpose()
    }

    async fn save_job(&self, job: &AssessmentJob) -> Result<(), StoreError> {
        let snapshot = job
            .inventory_snapshot
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO assessment_jobs (
                id, tenant_id, subscription_id, status, inventory_snapshot, error, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                inventory_snapshot = EXCLUDED.inventory_snapshot,
                error = EXCLUDED.error
            "#,
        )
        .bind(job.id)
        .bind(&job.tenant_id)
        .bind(&job.subscription_id)
        .bind(job.status.to_string())
        .bind(&snapshot)
        .bind(&job.error)
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        debug!(job_id = %job.id, status = %job.status, "평가 작업 저장");
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[cfg(test)]
mod tests {
    use relocator_core::PlanStatus;
    use serde_json::json;

    use super::*;

    fn plan_row(status: &str) -> PlanRow {
        let now = Utc::now();
        PlanRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            subscription_id: "sub1".to_string(),
            source_group: "rg-src".to_string(),
            target_group_id: "/subscriptions/sub1/resourceGroups/rg-dst".to_string(),
            batch: json!(["a", "b"]),
            status: status.to_string(),
            execution_log: Some(json!({"error": "boom"})),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_row_conversion() {
        let plan = MigrationPlan::try_from(plan_row("FAILED")).unwrap();
        assert_eq!(plan.status, PlanStatus::Failed);
        assert_eq!(plan.batch, vec!["a", "b"]);
        assert_eq!(
            plan.execution_log.and_then(|log| log.error).as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn test_corrupt_status_rejected() {
        let err = MigrationPlan::try_from(plan_row("DRAFT")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
