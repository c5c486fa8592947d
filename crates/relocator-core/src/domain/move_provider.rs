//! 외부 이동 서비스 추상화.
//!
//! 리소스 이동 검증/실행과 인벤토리 스캔을 위한 프로바이더 중립 인터페이스입니다.
//! 모든 호출은 네트워크 왕복을 포함하는 비동기 작업이며, 실행 호출은 원격
//! 장기 실행 작업(LRO)이 종료될 때까지 반환하지 않습니다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ScanResult;

// =============================================================================
// 요청/응답 타입
// =============================================================================

/// 리소스 이동 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub subscription_id: String,
    /// 원본 리소스 그룹 이름
    pub source_group: String,
    /// 대상 리소스 그룹 ID
    pub target_group_id: String,
    pub resource_ids: Vec<String>,
}

/// 이동 검증 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// 이동 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// 에러 타입
// =============================================================================

/// 재시도 대상 일시적 오류 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransientKind {
    /// 요청 한도 초과 (429)
    RateLimited,
    /// 서비스 일시 불가 (502, 503, 504)
    Unavailable,
    /// 프로바이더 내부 오류 (500)
    Internal,
    /// 연결 실패, 타임아웃
    Network,
}

impl TransientKind {
    /// HTTP 상태 코드 분류. 일시적 오류가 아니면 `None`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(TransientKind::RateLimited),
            500 => Some(TransientKind::Internal),
            502..=504 => Some(TransientKind::Unavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransientKind::RateLimited => write!(f, "rate_limited"),
            TransientKind::Unavailable => write!(f, "unavailable"),
            TransientKind::Internal => write!(f, "internal"),
            TransientKind::Network => write!(f, "network"),
        }
    }
}

/// 프로바이더 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// 일시적 오류 (재시도 대상)
    #[error("일시적 프로바이더 오류 ({kind}): {message}")]
    Transient {
        kind: TransientKind,
        message: String,
        /// 프로바이더가 지정한 재시도 대기 시간
        retry_after_ms: Option<u64>,
    },

    /// 프로바이더가 작업을 명시적으로 거부
    #[error("프로바이더 거부: {0}")]
    Rejected(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// 응답 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

impl ProviderError {
    /// 일시적 오류 생성.
    pub fn transient(kind: TransientKind, message: impl Into<String>) -> Self {
        ProviderError::Transient {
            kind,
            message: message.into(),
            retry_after_ms: None,
        }
    }

    /// 재시도 가능 여부.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transient { .. })
    }

    /// 재시도해도 복구될 수 없는 오류.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Authentication(_))
    }

    /// 프로바이더가 지정한 대기 시간 (밀리초).
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            ProviderError::Transient { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// 프로바이더 원문 메시지.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Transient { message, .. } => message,
            ProviderError::Rejected(message)
            | ProviderError::Authentication(message)
            | ProviderError::Parse(message)
            | ProviderError::Other(message) => message,
        }
    }
}

// =============================================================================
// Provider Traits
// =============================================================================

/// 이동 사전 검증.
#[async_trait]
pub trait MoveValidator: Send + Sync {
    /// 대상 그룹으로 이동 가능한지 검증.
    ///
    /// 명시적 거부는 `valid == false` 또는 `ProviderError::Rejected`로 반환합니다.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Transient`: 요청 한도 초과, 일시 불가, 내부 오류
    /// - `ProviderError::Rejected`: 프로바이더가 이동을 거부
    async fn validate(&self, request: &MoveRequest) -> Result<ValidationOutcome, ProviderError>;
}

/// 이동 실행.
#[async_trait]
pub trait MoveExecutor: Send + Sync {
    /// 리소스 이동 실행. 원격 작업이 종료될 때까지 대기합니다.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Transient`: 요청 한도 초과, 일시 불가, 내부 오류
    /// - `ProviderError::Rejected`: 프로바이더가 이동을 거부
    async fn execute(&self, request: &MoveRequest) -> Result<ExecutionOutcome, ProviderError>;
}

/// 구독 인벤토리 스캐너.
#[async_trait]
pub trait InventoryScanner: Send + Sync {
    /// 구독의 리소스 그룹과 리소스 목록 조회.
    async fn scan(&self, subscription_id: &str) -> Result<ScanResult, ProviderError>;

    /// 로깅용 프로바이더 이름.
    fn provider_name(&self) -> &str;
}
