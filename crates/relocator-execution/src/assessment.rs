//! 구독 평가 실행.

use std::sync::Arc;

use relocator_core::{
    AssessmentJob, AssessmentStore, InventoryScanner, InventorySnapshot, JobStatus, StoreError,
};
use relocator_provider::{with_retry, RetryConfig};
use tracing::{error, info};

/// 인벤토리 스캔 후 의존성 엣지를 포함한 스냅샷을 작업에 기록합니다.
///
/// 스캔의 일시적 오류는 검증 단계와 같은 정책으로 재시도합니다.
pub struct AssessmentRunner {
    scanner: Arc<dyn InventoryScanner>,
    jobs: Arc<dyn AssessmentStore>,
    retry: RetryConfig,
}

impl AssessmentRunner {
    pub fn new(scanner: Arc<dyn InventoryScanner>, jobs: Arc<dyn AssessmentStore>) -> Self {
        Self {
            scanner,
            jobs,
            retry: RetryConfig::validation(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// PENDING 작업 생성 및 저장.
    pub async fn create_job(
        &self,
        tenant_id: &str,
        subscription_id: &str,
    ) -> Result<AssessmentJob, StoreError> {
        let job = AssessmentJob::new(tenant_id, subscription_id);
        self.jobs.save_job(&job).await?;
        Ok(job)
    }

    /// 작업 실행 (PENDING → RUNNING → COMPLETED/FAILED).
    ///
    /// 스캔 실패는 작업 레코드에 기록되며, 저장 실패만 에러로 반환됩니다.
    pub async fn run(&self, mut job: AssessmentJob) -> Result<AssessmentJob, StoreError> {
        job.status = JobStatus::Running;
        self.jobs.save_job(&job).await?;

        info!(
            job_id = %job.id,
            subscription_id = %job.subscription_id,
            provider = self.scanner.provider_name(),
            "인벤토리 스캔 시작"
        );

        let subscription_id = job.subscription_id.as_str();
        let scanned = with_retry(&self.retry, || self.scanner.scan(subscription_id)).await;

        match scanned {
            Ok(scan) => {
                let snapshot = InventorySnapshot::assemble(job.subscription_id.clone(), scan);
                info!(
                    job_id = %job.id,
                    resources = snapshot.total_resources,
                    edges = snapshot.dependencies.len(),
                    "인벤토리 스캔 완료"
                );
                job.status = JobStatus::Completed;
                job.inventory_snapshot = Some(snapshot);
                job.error = None;
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "인벤토리 스캔 실패");
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
            }
        }

        self.jobs.save_job(&job).await?;
        Ok(job)
    }
}
