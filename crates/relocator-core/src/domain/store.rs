//! 계획/작업 저장소 추상화.
//!
//! 각 호출은 원자적이어야 합니다. 한 계획의 레코드는 해당 계획을 실행하는
//! 오케스트레이터 하나만 기록합니다.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::{AssessmentJob, MigrationPlan};

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 레코드 없음
    #[error("레코드를 찾을 수 없습니다: {0}")]
    NotFound(Uuid),

    /// 저장소 백엔드 에러 (연결, 쿼리 실패 등)
    #[error("저장소 에러: {0}")]
    Backend(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 저장된 값이 손상됨
    #[error("손상된 레코드: {0}")]
    Corrupt(String),
}

/// 마이그레이션 계획 저장소.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<MigrationPlan>, StoreError>;

    async fn save_plan(&self, plan: &MigrationPlan) -> Result<(), StoreError>;
}

/// 평가 작업 저장소.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn load_job(&self, job_id: Uuid) -> Result<Option<AssessmentJob>, StoreError>;

    async fn save_job(&self, job: &AssessmentJob) -> Result<(), StoreError>;
}
