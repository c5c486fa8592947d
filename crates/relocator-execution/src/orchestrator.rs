//! 마이그레이션 오케스트레이터.
//!
//! 한 계획을 PENDING에서 종료 상태까지 진행시킵니다.
//!
//! 1. PENDING → VALIDATING 저장
//! 2. 스냅샷이 있으면 직접 의존 대상 누락 검사 (누락 시 프로바이더 호출 없이 FAILED_VALIDATION)
//! 3. 프로바이더 이동 검증 (일시적 오류만 재시도)
//! 4. VALIDATING → MOVING 저장
//! 5. 프로바이더 이동 실행 (일시적 오류만 재시도)
//! 6. COMPLETED 또는 FAILED 저장
//!
//! 위 과정의 저장 실패나 패닉은 최상위에서 잡아 CRASHED로 기록합니다.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use relocator_core::{
    DependencyResolver, ExecutionLog, InventorySnapshot, MigrationPlan, MoveExecutor,
    MoveRequest, MoveValidator, PlanStatus, PlanStore,
};
use relocator_provider::{with_retry_context, RetryConfig};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{MissingDependencies, OrchestrationError};

/// 단계별 재시도 설정.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub validate_retry: RetryConfig,
    pub execute_retry: RetryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            validate_retry: RetryConfig::validation(),
            execute_retry: RetryConfig::execution(),
        }
    }
}

/// 마이그레이션 상태 머신.
pub struct MigrationOrchestrator {
    validator: Arc<dyn MoveValidator>,
    executor: Arc<dyn MoveExecutor>,
    store: Arc<dyn PlanStore>,
    config: OrchestratorConfig,
}

impl MigrationOrchestrator {
    pub fn new(
        validator: Arc<dyn MoveValidator>,
        executor: Arc<dyn MoveExecutor>,
        store: Arc<dyn PlanStore>,
    ) -> Self {
        Self {
            validator,
            executor,
            store,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.store
    }

    /// 계획을 종료 상태까지 실행하고 최종 상태를 반환합니다.
    ///
    /// 실패는 계획 레코드(상태 + 실행 로그)로만 드러나며 호출자에게 전파되지 않습니다.
    /// PENDING이 아닌 계획은 변경하지 않고 현재 상태를 그대로 반환합니다.
    pub async fn run(
        &self,
        mut plan: MigrationPlan,
        snapshot: Option<Arc<InventorySnapshot>>,
    ) -> PlanStatus {
        if plan.status != PlanStatus::Pending {
            warn!(
                plan_id = %plan.id,
                status = %plan.status,
                "PENDING 상태가 아닌 계획은 실행하지 않습니다"
            );
            return plan.status;
        }

        info!(
            plan_id = %plan.id,
            batch = plan.batch.len(),
            source_group = %plan.source_group,
            target_group = %plan.target_group_id,
            "마이그레이션 시작"
        );

        let result = AssertUnwindSafe(self.drive(&mut plan, snapshot.as_deref()))
            .catch_unwind()
            .await;

        let fault = match result {
            Ok(Ok(status)) => {
                info!(plan_id = %plan.id, status = %status, "마이그레이션 종료");
                return status;
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic),
        };

        error!(
            plan_id = %plan.id,
            status = %plan.status,
            error = %fault,
            "마이그레이션 중 처리되지 않은 오류, CRASHED로 전환"
        );
        self.force_crash(&mut plan, fault).await
    }

    /// 실행 기회를 얻지 못한 계획을 CRASHED로 기록 (종료 대기 중 취소 등).
    pub async fn abandon(&self, mut plan: MigrationPlan, reason: &str) -> PlanStatus {
        if plan.is_terminal() {
            return plan.status;
        }
        warn!(plan_id = %plan.id, reason, "실행 전 계획 포기");
        self.force_crash(&mut plan, reason.to_string()).await
    }

    async fn drive(
        &self,
        plan: &mut MigrationPlan,
        snapshot: Option<&InventorySnapshot>,
    ) -> Result<PlanStatus, OrchestrationError> {
        self.advance(plan, PlanStatus::Validating).await?;

        if let Some(snapshot) = snapshot {
            if let Err(guard) = check_dependencies(snapshot, &plan.batch) {
                warn!(
                    plan_id = %plan.id,
                    missing = ?guard.missing,
                    "의존성 검사 실패, 프로바이더 검증 생략"
                );
                return self
                    .conclude(plan, PlanStatus::FailedValidation, ExecutionLog::error(guard.to_string()))
                    .await;
            }
        }

        let request = plan.move_request();

        if let Err(message) = self.validate(plan.id, &request).await {
            return self
                .conclude(plan, PlanStatus::FailedValidation, ExecutionLog::error(message))
                .await;
        }

        self.advance(plan, PlanStatus::Moving).await?;

        match self.execute(plan.id, &request).await {
            Ok(()) => {
                self.conclude(plan, PlanStatus::Completed, ExecutionLog::success())
                    .await
            }
            Err(message) => {
                self.conclude(plan, PlanStatus::Failed, ExecutionLog::error(message))
                    .await
            }
        }
    }

    /// 프로바이더 검증. 거부 시 프로바이더 메시지 반환.
    async fn validate(&self, plan_id: Uuid, request: &MoveRequest) -> Result<(), String> {
        let result = with_retry_context(&self.config.validate_retry, |ctx| async move {
            if ctx.attempt > 0 {
                debug!(
                    plan_id = %plan_id,
                    attempt = ctx.attempt + 1,
                    max_attempts = ctx.max_retries + 1,
                    last_error = ctx.last_error.as_deref().unwrap_or_default(),
                    "이동 검증 재시도"
                );
            }
            self.validator.validate(request).await
        })
        .await;

        match result {
            Ok((outcome, stats)) if outcome.valid => {
                debug!(plan_id = %plan_id, attempts = stats.total_attempts, "이동 검증 통과");
                Ok(())
            }
            Ok((outcome, _)) => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "이동 검증이 거부되었습니다".to_string());
                warn!(plan_id = %plan_id, error = %message, "이동 검증 거부");
                Err(message)
            }
            Err(failure) => {
                warn!(
                    plan_id = %plan_id,
                    attempts = failure.stats.total_attempts,
                    error = %failure.error,
                    "이동 검증 실패"
                );
                Err(failure.error.message().to_string())
            }
        }
    }

    /// 프로바이더 이동 실행. 실패 시 프로바이더 메시지 반환.
    async fn execute(&self, plan_id: Uuid, request: &MoveRequest) -> Result<(), String> {
        let result = with_retry_context(&self.config.execute_retry, |ctx| async move {
            if ctx.attempt > 0 {
                debug!(
                    plan_id = %plan_id,
                    attempt = ctx.attempt + 1,
                    max_attempts = ctx.max_retries + 1,
                    last_error = ctx.last_error.as_deref().unwrap_or_default(),
                    "이동 실행 재시도"
                );
            }
            self.executor.execute(request).await
        })
        .await;

        match result {
            Ok((outcome, stats)) if outcome.success => {
                debug!(
                    plan_id = %plan_id,
                    attempts = stats.total_attempts,
                    delay_ms = stats.total_delay.as_millis(),
                    "이동 실행 완료"
                );
                Ok(())
            }
            Ok((outcome, _)) => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "이동 실행이 거부되었습니다".to_string());
                warn!(plan_id = %plan_id, error = %message, "이동 실행 거부");
                Err(message)
            }
            Err(failure) => {
                warn!(
                    plan_id = %plan_id,
                    attempts = failure.stats.total_attempts,
                    error = %failure.error,
                    "이동 실행 실패"
                );
                Err(failure.error.message().to_string())
            }
        }
    }

    async fn advance(
        &self,
        plan: &mut MigrationPlan,
        next: PlanStatus,
    ) -> Result<(), OrchestrationError> {
        let from = plan.status;
        plan.transition(next)?;
        self.store.save_plan(plan).await?;
        info!(plan_id = %plan.id, from = %from, to = %next, "계획 상태 전이");
        Ok(())
    }

    async fn conclude(
        &self,
        plan: &mut MigrationPlan,
        terminal: PlanStatus,
        log: ExecutionLog,
    ) -> Result<PlanStatus, OrchestrationError> {
        let from = plan.status;
        plan.finish(terminal, log)?;
        self.store.save_plan(plan).await?;
        info!(plan_id = %plan.id, from = %from, to = %terminal, "계획 종료 상태 기록");
        Ok(terminal)
    }

    async fn force_crash(&self, plan: &mut MigrationPlan, message: String) -> PlanStatus {
        plan.crash(message);

        match AssertUnwindSafe(self.store.save_plan(plan))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(plan_id = %plan.id, error = %e, "CRASHED 상태 저장 실패");
            }
            Err(panic) => {
                error!(
                    plan_id = %plan.id,
                    error = %panic_message(panic),
                    "CRASHED 상태 저장 중 패닉"
                );
            }
        }

        PlanStatus::Crashed
    }
}

/// 배치의 직접 의존 대상 누락 검사.
pub fn check_dependencies(
    snapshot: &InventorySnapshot,
    batch: &[String],
) -> Result<(), MissingDependencies> {
    let missing = DependencyResolver::from_snapshot(snapshot).missing_dependencies(batch);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingDependencies { missing })
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("패닉: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("패닉: {}", message)
    } else {
        "패닉: 알 수 없는 원인".to_string()
    }
}
