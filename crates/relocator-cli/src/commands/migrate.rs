//! 리소스 이동 실행 명령.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use relocator_core::{AssessmentJob, MoveExecutor, MoveValidator};
use relocator_execution::{
    MigrationDispatcher, MigrationOrchestrator, MigrationRequest, MigrationService,
};
use relocator_provider::{ArmMoveClient, ScriptedMoveProvider};
use tracing::{info, warn};

use super::{load_snapshot, open_store};
use crate::config::RelocatorConfig;

/// migrate 명령 설정
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub snapshot: PathBuf,
    pub source_group: String,
    pub target_group_id: String,
    pub ids: Vec<String>,
    /// ARM 대신 항상 성공하는 스크립트 프로바이더 사용
    pub dry_run: bool,
}

/// 이동을 접수하고 종료 상태까지 기다린 뒤 계획 레코드를 JSON으로 반환.
pub async fn run_migrate(
    config: &MigrateConfig,
    settings: &RelocatorConfig,
) -> anyhow::Result<String> {
    let snapshot = load_snapshot(&config.snapshot)?;
    let (jobs, plans) = open_store(settings).await?;

    let (validator, executor): (Arc<dyn MoveValidator>, Arc<dyn MoveExecutor>) =
        if config.dry_run {
            warn!("dry-run: ARM 호출 없이 스크립트 프로바이더로 실행합니다");
            let provider = Arc::new(ScriptedMoveProvider::new());
            let validator: Arc<dyn MoveValidator> = provider.clone();
            (validator, provider)
        } else {
            let client = Arc::new(
                ArmMoveClient::new(settings.arm_config()?)
                    .context("ARM 클라이언트 생성 실패")?,
            );
            let validator: Arc<dyn MoveValidator> = client.clone();
            (validator, client)
        };

    let job = AssessmentJob::completed("cli", snapshot);
    jobs.save_job(&job).await?;
    info!(job_id = %job.id, resources = config.ids.len(), "평가 작업 등록 완료");

    let orchestrator = Arc::new(
        MigrationOrchestrator::new(validator, executor, plans.clone())
            .with_config(settings.orchestrator_config()),
    );
    let dispatcher = MigrationDispatcher::new(orchestrator, settings.max_concurrent);
    let service = MigrationService::new(jobs, plans, dispatcher);

    let accepted = service
        .submit(MigrationRequest {
            job_id: job.id,
            source_resource_group: config.source_group.clone(),
            target_resource_group_id: config.target_group_id.clone(),
            resources: config.ids.clone(),
        })
        .await?;
    info!(plan_id = %accepted.plan_id, status = %accepted.status, "이동 요청 접수");

    service.dispatcher().drain().await;

    let plan = service.plan(accepted.plan_id).await?;
    info!(plan_id = %plan.id, status = %plan.status.as_str(), "이동 종료");

    Ok(serde_json::to_string_pretty(&plan)?)
}
