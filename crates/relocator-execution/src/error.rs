//! 오케스트레이션 및 요청 처리 에러.

use std::collections::BTreeSet;

use relocator_core::{PlanTransitionError, StoreError};
use thiserror::Error;
use uuid::Uuid;

/// 실행 중 CRASHED로 이어지는 내부 오류.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// 계획 저장 실패
    #[error("계획 저장 실패: {0}")]
    Persistence(#[from] StoreError),

    /// 상태 머신 위반
    #[error(transparent)]
    Transition(#[from] PlanTransitionError),
}

/// 사전 의존성 검사 실패 (배치에 직접 의존 대상 누락).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("이동 배치에 필요한 의존 리소스가 빠져 있습니다: {}", format_ids(.missing))]
pub struct MissingDependencies {
    pub missing: BTreeSet<String>,
}

fn format_ids(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// 이동 요청 접수 에러.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 이동 대상 리소스 없음
    #[error("이동할 리소스가 없습니다")]
    EmptyBatch,

    /// 평가 작업 없음
    #[error("평가 작업을 찾을 수 없습니다: {0}")]
    JobNotFound(Uuid),

    /// 리소스 ID에서 구독을 추출할 수 없음
    #[error("잘못된 리소스 ID: {0}")]
    InvalidResourceId(String),

    /// 계획 없음
    #[error("계획을 찾을 수 없습니다: {0}")]
    PlanNotFound(Uuid),

    /// 저장소 에러
    #[error(transparent)]
    Store(#[from] StoreError),
}
