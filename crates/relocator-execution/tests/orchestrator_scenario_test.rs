//! 마이그레이션 오케스트레이터 시나리오 테스트
//!
//! 대본 프로바이더와 인메모리 저장소로 상태 전이, 재시도, 장애 처리를 검증합니다.
//!
//! ## 시나리오
//!
//! 1. 의존성 누락: 프로바이더 호출 없이 FAILED_VALIDATION
//! 2. 일시적 오류 2회 후 성공: 4초 + 8초 백오프 후 COMPLETED
//! 3. 실행 거부: 프로바이더 메시지 그대로 FAILED
//! 4. 저장 실패, 패닉: CRASHED

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relocator_core::{
    ExecutionOutcome, InventorySnapshot, MigrationPlan, MoveExecutor, MoveRequest, PlanStatus,
    PlanStore, ProviderError, Resource, ScanResult, StoreError, TransientKind, ValidationOutcome,
};
use relocator_execution::{MemoryStore, MigrationDispatcher, MigrationOrchestrator};
use relocator_provider::ScriptedMoveProvider;
use serde_json::json;
use uuid::Uuid;

const VNET: &str =
    "/subscriptions/sub1/resourceGroups/rg-src/providers/Microsoft.Network/virtualNetworks/vnet1";
const NIC: &str =
    "/subscriptions/sub1/resourceGroups/rg-src/providers/Microsoft.Network/networkInterfaces/nic1";
const VM: &str =
    "/subscriptions/sub1/resourceGroups/rg-src/providers/Microsoft.Compute/virtualMachines/vm1";

// ============================================================================
// 테스트 헬퍼
// ============================================================================

fn snapshot() -> Arc<InventorySnapshot> {
    let resources = vec![
        Resource::new(VNET, "Microsoft.Network/virtualNetworks"),
        Resource::new(NIC, "Microsoft.Network/networkInterfaces").with_properties(json!({
            "ipConfigurations": [{ "properties": { "subnet": { "vnetId": VNET } } }]
        })),
        Resource::new(VM, "Microsoft.Compute/virtualMachines").with_properties(json!({
            "networkProfile": { "networkInterfaces": [{ "id": NIC }] }
        })),
    ];
    Arc::new(InventorySnapshot::assemble(
        "sub1",
        ScanResult {
            resources,
            ..Default::default()
        },
    ))
}

fn plan(batch: &[&str]) -> MigrationPlan {
    MigrationPlan::new(
        Uuid::new_v4(),
        "sub1",
        "rg-src",
        "/subscriptions/sub1/resourceGroups/rg-dst",
        batch.iter().map(|id| id.to_string()).collect(),
    )
}

fn transient(kind: TransientKind) -> ProviderError {
    ProviderError::transient(kind, "잠시 후 다시 시도하세요")
}

fn orchestrator(
    provider: &Arc<ScriptedMoveProvider>,
    store: Arc<dyn PlanStore>,
) -> MigrationOrchestrator {
    MigrationOrchestrator::new(provider.clone(), provider.clone(), store)
}

fn log_error(plan: &MigrationPlan) -> String {
    plan.execution_log
        .as_ref()
        .and_then(|log| log.error.clone())
        .unwrap_or_default()
}

/// 지정한 상태 저장 시 실패하는 저장소.
struct FailingStore {
    inner: MemoryStore,
    fail_on: Vec<PlanStatus>,
}

#[async_trait]
impl PlanStore for FailingStore {
    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<MigrationPlan>, StoreError> {
        self.inner.load_plan(plan_id).await
    }

    async fn save_plan(&self, plan: &MigrationPlan) -> Result<(), StoreError> {
        if self.fail_on.contains(&plan.status) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.save_plan(plan).await
    }
}

/// 호출 시 패닉하는 실행기.
struct PanickingExecutor;

#[async_trait]
impl MoveExecutor for PanickingExecutor {
    async fn execute(&self, _request: &MoveRequest) -> Result<ExecutionOutcome, ProviderError> {
        panic!("executor exploded");
    }
}

/// 오래 걸리는 실행기.
struct SlowExecutor;

#[async_trait]
impl MoveExecutor for SlowExecutor {
    async fn execute(&self, _request: &MoveRequest) -> Result<ExecutionOutcome, ProviderError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ExecutionOutcome::succeeded())
    }
}

// ============================================================================
// 정상 경로
// ============================================================================

#[tokio::test]
async fn test_complete_batch_reaches_completed() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let plan = plan(&[VNET, NIC, VM]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone())
        .run(plan, Some(snapshot()))
        .await;

    assert_eq!(status, PlanStatus::Completed);
    assert_eq!(
        store.status_history(plan_id).await,
        vec![
            PlanStatus::Validating,
            PlanStatus::Moving,
            PlanStatus::Completed
        ]
    );

    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    assert!(saved.execution_log.unwrap().is_success());
    assert_eq!(provider.validate_calls(), 1);
    assert_eq!(provider.execute_calls(), 1);
}

#[tokio::test]
async fn test_without_snapshot_skips_guard() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());

    let status = orchestrator(&provider, store).run(plan(&[VM]), None).await;

    assert_eq!(status, PlanStatus::Completed);
    assert_eq!(provider.validate_calls(), 1);
}

// ============================================================================
// 검증 실패
// ============================================================================

#[tokio::test]
async fn test_missing_dependency_never_reaches_provider() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let plan = plan(&[VM]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone())
        .run(plan, Some(snapshot()))
        .await;

    assert_eq!(status, PlanStatus::FailedValidation);
    assert_eq!(provider.validate_calls(), 0);
    assert_eq!(provider.execute_calls(), 0);

    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    let error = log_error(&saved);
    assert!(error.contains(&NIC.to_lowercase()));
    // 직접 의존 대상만 보고됨
    assert!(!error.contains(&VNET.to_lowercase()));
    assert_eq!(
        store.status_history(plan_id).await,
        vec![PlanStatus::Validating, PlanStatus::FailedValidation]
    );
}

#[tokio::test]
async fn test_validator_refusal_keeps_message() {
    let provider = Arc::new(ScriptedMoveProvider::with_scripts(
        vec![Ok(ValidationOutcome::invalid(
            "Cross-subscription move is not supported for vm1",
        ))],
        vec![],
    ));
    let store = Arc::new(MemoryStore::new());
    let plan = plan(&[VNET]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone()).run(plan, None).await;

    assert_eq!(status, PlanStatus::FailedValidation);
    assert_eq!(provider.execute_calls(), 0);
    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(
        log_error(&saved),
        "Cross-subscription move is not supported for vm1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_validator_transient_exhausted() {
    let provider = Arc::new(ScriptedMoveProvider::with_scripts(
        vec![
            Err(transient(TransientKind::RateLimited)),
            Err(transient(TransientKind::RateLimited)),
            Err(transient(TransientKind::RateLimited)),
            Ok(ValidationOutcome::valid()),
        ],
        vec![],
    ));
    let store = Arc::new(MemoryStore::new());
    let started = tokio::time::Instant::now();

    let status = orchestrator(&provider, store).run(plan(&[VNET]), None).await;

    assert_eq!(status, PlanStatus::FailedValidation);
    assert_eq!(provider.validate_calls(), 3);
    assert_eq!(provider.execute_calls(), 0);
    assert!(started.elapsed() >= Duration::from_secs(2 + 4));
}

// ============================================================================
// 실행
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_executor_transient_twice_then_success() {
    let provider = Arc::new(ScriptedMoveProvider::with_scripts(
        vec![],
        vec![
            Err(transient(TransientKind::Unavailable)),
            Err(transient(TransientKind::Internal)),
            Ok(ExecutionOutcome::succeeded()),
        ],
    ));
    let store = Arc::new(MemoryStore::new());
    let started = tokio::time::Instant::now();

    let status = orchestrator(&provider, store).run(plan(&[VNET]), None).await;

    assert_eq!(status, PlanStatus::Completed);
    assert_eq!(provider.execute_calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(4 + 8));
}

#[tokio::test]
async fn test_executor_rejection_is_terminal() {
    let provider = Arc::new(ScriptedMoveProvider::with_scripts(
        vec![],
        vec![Err(ProviderError::Rejected(
            "ResourceMoveFailed: nic1 is attached to a running VM".to_string(),
        ))],
    ));
    let store = Arc::new(MemoryStore::new());
    let plan = plan(&[NIC, VNET]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone()).run(plan, None).await;

    assert_eq!(status, PlanStatus::Failed);
    assert_eq!(provider.execute_calls(), 1);
    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(
        log_error(&saved),
        "ResourceMoveFailed: nic1 is attached to a running VM"
    );
}

#[tokio::test]
async fn test_executor_authentication_not_retried() {
    let provider = Arc::new(ScriptedMoveProvider::with_scripts(
        vec![],
        vec![Err(ProviderError::Authentication("token expired".to_string()))],
    ));
    let store = Arc::new(MemoryStore::new());

    let status = orchestrator(&provider, store).run(plan(&[VNET]), None).await;

    assert_eq!(status, PlanStatus::Failed);
    assert_eq!(provider.execute_calls(), 1);
}

// ============================================================================
// 장애 처리
// ============================================================================

#[tokio::test]
async fn test_persistence_fault_forces_crashed() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        fail_on: vec![PlanStatus::Moving],
    });
    let plan = plan(&[VNET]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone()).run(plan, None).await;

    assert_eq!(status, PlanStatus::Crashed);
    assert_eq!(provider.execute_calls(), 0);
    assert_eq!(
        store.inner.status_history(plan_id).await,
        vec![PlanStatus::Validating, PlanStatus::Crashed]
    );
    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    assert!(log_error(&saved).contains("connection reset"));
}

#[tokio::test]
async fn test_crash_persistence_failure_still_reports_crashed() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        fail_on: vec![PlanStatus::Validating, PlanStatus::Crashed],
    });
    let plan = plan(&[VNET]);
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone()).run(plan, None).await;

    assert_eq!(status, PlanStatus::Crashed);
    assert_eq!(provider.validate_calls(), 0);
    assert!(store.inner.status_history(plan_id).await.is_empty());
}

#[tokio::test]
async fn test_panic_is_caught_and_crashed() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let plan = plan(&[VNET]);
    let plan_id = plan.id;

    let orchestrator =
        MigrationOrchestrator::new(provider.clone(), Arc::new(PanickingExecutor), store.clone());
    let status = orchestrator.run(plan, None).await;

    assert_eq!(status, PlanStatus::Crashed);
    let saved = store.load_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(saved.status, PlanStatus::Crashed);
    assert!(log_error(&saved).contains("executor exploded"));
    assert_eq!(
        store.status_history(plan_id).await,
        vec![PlanStatus::Validating, PlanStatus::Moving, PlanStatus::Crashed]
    );
}

#[tokio::test]
async fn test_non_pending_plan_refused() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let mut plan = plan(&[VNET]);
    plan.transition(PlanStatus::Validating).unwrap();
    let plan_id = plan.id;

    let status = orchestrator(&provider, store.clone()).run(plan, None).await;

    assert_eq!(status, PlanStatus::Validating);
    assert_eq!(provider.validate_calls(), 0);
    assert!(store.status_history(plan_id).await.is_empty());
}

// ============================================================================
// 디스패처
// ============================================================================

#[tokio::test]
async fn test_dispatcher_runs_all_plans() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let dispatcher =
        MigrationDispatcher::new(Arc::new(orchestrator(&provider, store.clone())), 2);

    let ids: Vec<Uuid> = (0..5)
        .map(|_| {
            let plan = plan(&[VNET]);
            let id = plan.id;
            dispatcher.submit(plan, None);
            id
        })
        .collect();

    dispatcher.drain().await;

    for id in ids {
        let saved = store.load_plan(id).await.unwrap().unwrap();
        assert_eq!(saved.status, PlanStatus::Completed);
    }
    assert_eq!(provider.execute_calls(), 5);
    assert_eq!(dispatcher.in_flight(), 0);
    assert!(!dispatcher.is_closed());
}

#[tokio::test]
async fn test_drain_after_shutdown_stays_closed() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let dispatcher =
        MigrationDispatcher::new(Arc::new(orchestrator(&provider, store.clone())), 2);

    let first = dispatcher.submit(plan(&[VNET]), None);
    tokio::join!(dispatcher.drain(), dispatcher.shutdown());
    assert!(first.await.unwrap().is_terminal());
    assert!(dispatcher.is_closed());

    dispatcher.drain().await;
    assert!(dispatcher.is_closed());

    // 종료 후 예약된 계획은 실행되지 않고 CRASHED로 기록
    let late = plan(&[NIC]);
    let late_id = late.id;
    assert_eq!(dispatcher.submit(late, None).await.unwrap(), PlanStatus::Crashed);
    assert_eq!(
        store.load_plan(late_id).await.unwrap().unwrap().status,
        PlanStatus::Crashed
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_queued_plans() {
    let provider = Arc::new(ScriptedMoveProvider::new());
    let store = Arc::new(MemoryStore::new());
    let orchestrator =
        MigrationOrchestrator::new(provider.clone(), Arc::new(SlowExecutor), store.clone());
    let dispatcher = MigrationDispatcher::new(Arc::new(orchestrator), 1);

    let running = plan(&[VNET]);
    let queued = plan(&[NIC]);
    let (running_id, queued_id) = (running.id, queued.id);

    let running_handle = dispatcher.submit(running, None);
    let queued_handle = dispatcher.submit(queued, None);

    // 첫 계획이 허가를 얻고 실행 단계에 들어가도록 양보
    tokio::time::sleep(Duration::from_millis(1)).await;
    dispatcher.shutdown().await;

    assert_eq!(running_handle.await.unwrap(), PlanStatus::Completed);
    assert_eq!(queued_handle.await.unwrap(), PlanStatus::Crashed);

    let queued = store.load_plan(queued_id).await.unwrap().unwrap();
    assert_eq!(queued.status, PlanStatus::Crashed);
    assert_eq!(store.status_history(queued_id).await, vec![PlanStatus::Crashed]);
    assert_eq!(
        store.load_plan(running_id).await.unwrap().unwrap().status,
        PlanStatus::Completed
    );
}
