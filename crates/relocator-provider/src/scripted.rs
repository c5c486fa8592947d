//! 응답 대본 기반 이동 프로바이더.
//!
//! 미리 넣어 둔 응답을 순서대로 돌려주고, 대본이 비면 성공을 반환합니다.
//! 테스트와 `--dry-run` 실행에 사용됩니다.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use relocator_core::{
    ExecutionOutcome, MoveExecutor, MoveRequest, MoveValidator, ProviderError, ValidationOutcome,
};
use tokio::sync::Mutex;
use tracing::debug;

/// 대본 기반 검증/실행 프로바이더.
#[derive(Debug, Default)]
pub struct ScriptedMoveProvider {
    validate_script: Mutex<VecDeque<Result<ValidationOutcome, ProviderError>>>,
    execute_script: Mutex<VecDeque<Result<ExecutionOutcome, ProviderError>>>,
    requests: Mutex<Vec<MoveRequest>>,
    validate_calls: AtomicU32,
    execute_calls: AtomicU32,
}

impl ScriptedMoveProvider {
    /// 항상 성공하는 프로바이더.
    pub fn new() -> Self {
        Self::default()
    }

    /// 검증 응답 추가.
    pub async fn push_validation(&self, reply: Result<ValidationOutcome, ProviderError>) {
        self.validate_script.lock().await.push_back(reply);
    }

    /// 실행 응답 추가.
    pub async fn push_execution(&self, reply: Result<ExecutionOutcome, ProviderError>) {
        self.execute_script.lock().await.push_back(reply);
    }

    /// 생성 시점에 대본 지정.
    pub fn with_scripts(
        validations: Vec<Result<ValidationOutcome, ProviderError>>,
        executions: Vec<Result<ExecutionOutcome, ProviderError>>,
    ) -> Self {
        Self {
            validate_script: Mutex::new(validations.into()),
            execute_script: Mutex::new(executions.into()),
            ..Default::default()
        }
    }

    pub fn validate_calls(&self) -> u32 {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> u32 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    /// 받은 요청 목록 (검증, 실행 순).
    pub async fn requests(&self) -> Vec<MoveRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl MoveValidator for ScriptedMoveProvider {
    async fn validate(&self, request: &MoveRequest) -> Result<ValidationOutcome, ProviderError> {
        let call = self.validate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(request.clone());

        let reply = self
            .validate_script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ValidationOutcome::valid()));
        debug!(call, ok = reply.is_ok(), "대본 검증 응답");
        reply
    }
}

#[async_trait]
impl MoveExecutor for ScriptedMoveProvider {
    async fn execute(&self, request: &MoveRequest) -> Result<ExecutionOutcome, ProviderError> {
        let call = self.execute_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(request.clone());

        let reply = self
            .execute_script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ExecutionOutcome::succeeded()));
        debug!(call, ok = reply.is_ok(), "대본 실행 응답");
        reply
    }
}
