//! 인메모리 저장소.

use std::collections::HashMap;

use async_trait::async_trait;
use relocator_core::{
    AssessmentJob, AssessmentStore, MigrationPlan, PlanStatus, PlanStore, StoreError,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 프로세스 내 계획/작업 저장소.
///
/// 계획마다 저장된 상태 순서를 함께 기록합니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    plans: RwLock<HashMap<Uuid, MigrationPlan>>,
    history: RwLock<HashMap<Uuid, Vec<PlanStatus>>>,
    jobs: RwLock<HashMap<Uuid, AssessmentJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장 호출마다 기록된 상태 순서.
    pub async fn status_history(&self, plan_id: Uuid) -> Vec<PlanStatus> {
        self.history
            .read()
            .await
            .get(&plan_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn plans(&self) -> Vec<MigrationPlan> {
        self.plans.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<MigrationPlan>, StoreError> {
        Ok(self.plans.read().await.get(&plan_id).cloned())
    }

    async fn save_plan(&self, plan: &MigrationPlan) -> Result<(), StoreError> {
        self.plans.write().await.insert(plan.id, plan.clone());
        self.history
            .write()
            .await
            .entry(plan.id)
            .or_default()
            .push(plan.status);
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn load_job(&self, job_id: Uuid) -> Result<Option<AssessmentJob>, StoreError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn save_job(&self, job: &AssessmentJob) -> Result<(), StoreError> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }
}
