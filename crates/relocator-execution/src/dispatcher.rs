//! 마이그레이션 백그라운드 실행기.
//!
//! 계획마다 tokio 태스크 하나를 띄우고 세마포어로 동시 실행 수를 제한합니다.
//! 종료 시 허가를 기다리던 계획은 CRASHED로 기록되고, 이미 시작된 계획은
//! 종료 상태에 도달할 때까지 기다립니다.

use std::sync::Arc;

use relocator_core::{InventorySnapshot, MigrationPlan, PlanStatus};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::orchestrator::MigrationOrchestrator;

const ABANDON_REASON: &str = "실행 대기 중 디스패처가 종료되었습니다";

/// 제한된 동시성의 계획 실행기.
#[derive(Clone)]
pub struct MigrationDispatcher {
    orchestrator: Arc<MigrationOrchestrator>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl MigrationDispatcher {
    /// `max_concurrent`가 0이면 1로 취급합니다.
    pub fn new(orchestrator: Arc<MigrationOrchestrator>, max_concurrent: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn orchestrator(&self) -> &Arc<MigrationOrchestrator> {
        &self.orchestrator
    }

    /// 실행 예약. 호출자는 완료를 기다리지 않아도 됩니다.
    pub fn submit(
        &self,
        plan: MigrationPlan,
        snapshot: Option<Arc<InventorySnapshot>>,
    ) -> JoinHandle<PlanStatus> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let permits = Arc::clone(&self.permits);
        let shutdown = self.shutdown.clone();
        let plan_id = plan.id;

        debug!(plan_id = %plan_id, "계획 실행 예약");

        self.tracker.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };

            match permit {
                Some(_permit) => orchestrator.run(plan, snapshot).await,
                None => orchestrator.abandon(plan, ABANDON_REASON).await,
            }
        })
    }

    /// 실행 중이거나 대기 중인 계획 수.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// 종료 후에는 true.
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// 지금까지 예약된 모든 계획이 끝날 때까지 대기.
    ///
    /// 종료된 디스패처는 다시 열지 않습니다.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        if !self.shutdown.is_cancelled() {
            self.tracker.reopen();
        }
    }

    /// 대기 중인 계획을 취소하고 실행 중인 계획의 종료를 기다립니다.
    pub async fn shutdown(&self) {
        info!(in_flight = self.tracker.len(), "디스패처 종료");
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
