//! 이동 요청 접수.
//!
//! 요청을 검사해 PENDING 계획을 만들고 저장한 뒤 디스패처에 넘깁니다.
//! 실행 결과는 계획 레코드를 다시 읽어 확인합니다.

use std::collections::HashSet;
use std::sync::Arc;

use relocator_core::{
    canonical_id, subscription_of, AssessmentStore, DependencyResolver, InventorySnapshot,
    MigrationPlan, PlanStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::dispatcher::MigrationDispatcher;
use crate::error::ServiceError;

/// 이동 요청.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// 의존성 검사 기준이 되는 평가 작업
    pub job_id: Uuid,
    pub source_resource_group: String,
    pub target_resource_group_id: String,
    pub resources: Vec<String>,
}

/// 접수 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationAccepted {
    pub plan_id: Uuid,
    pub status: String,
}

/// 이동 요청 서비스.
pub struct MigrationService {
    jobs: Arc<dyn AssessmentStore>,
    plans: Arc<dyn PlanStore>,
    dispatcher: MigrationDispatcher,
}

impl MigrationService {
    pub fn new(
        jobs: Arc<dyn AssessmentStore>,
        plans: Arc<dyn PlanStore>,
        dispatcher: MigrationDispatcher,
    ) -> Self {
        Self {
            jobs,
            plans,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &MigrationDispatcher {
        &self.dispatcher
    }

    /// 이동 요청 접수.
    ///
    /// # Errors
    ///
    /// - `ServiceError::EmptyBatch`: 리소스 목록이 비어 있음
    /// - `ServiceError::JobNotFound`: 평가 작업 없음
    /// - `ServiceError::InvalidResourceId`: 첫 리소스 ID에서 구독을 찾을 수 없음
    pub async fn submit(&self, request: MigrationRequest) -> Result<MigrationAccepted, ServiceError> {
        let first = request.resources.first().ok_or(ServiceError::EmptyBatch)?;
        let subscription_id = subscription_of(first)
            .ok_or_else(|| ServiceError::InvalidResourceId(first.clone()))?
            .to_string();

        let job = self
            .jobs
            .load_job(request.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(request.job_id))?;

        let snapshot = job.inventory_snapshot.map(Arc::new);
        let batch = order_batch(snapshot.as_deref(), &request.resources);

        let plan = MigrationPlan::new(
            job.id,
            subscription_id,
            request.source_resource_group,
            request.target_resource_group_id,
            batch,
        );
        self.plans.save_plan(&plan).await?;

        info!(
            plan_id = %plan.id,
            job_id = %job.id,
            batch = plan.batch.len(),
            "이동 요청 접수"
        );

        let plan_id = plan.id;
        self.dispatcher.submit(plan, snapshot);

        Ok(MigrationAccepted {
            plan_id,
            status: "ACCEPTED".to_string(),
        })
    }

    /// 계획 레코드 조회.
    pub async fn plan(&self, plan_id: Uuid) -> Result<MigrationPlan, ServiceError> {
        self.plans
            .load_plan(plan_id)
            .await?
            .ok_or(ServiceError::PlanNotFound(plan_id))
    }
}

/// 스냅샷에 있는 리소스는 의존성 순서로, 나머지는 요청 순서로 배치.
fn order_batch(snapshot: Option<&InventorySnapshot>, resources: &[String]) -> Vec<String> {
    let Some(snapshot) = snapshot else {
        return resources.to_vec();
    };

    let resolver = DependencyResolver::from_snapshot(snapshot);
    let mut batch: Vec<String> = resolver
        .topological_order(resources)
        .into_iter()
        .map(|resource| resource.id.clone())
        .collect();

    let mut seen = HashSet::new();
    for id in resources {
        if !resolver.contains(id) && seen.insert(canonical_id(id)) {
            batch.push(id.clone());
        }
    }

    batch
}
