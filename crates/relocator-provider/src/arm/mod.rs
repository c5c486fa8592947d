//! Azure Resource Manager 리소스 이동 커넥터.
//!
//! `validateMoveResources`/`moveResources` 작업을 호출하고, 202 응답은
//! `Location` 헤더를 따라 장기 실행 작업(LRO)이 끝날 때까지 폴링합니다.

mod client;

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

pub use client::ArmMoveClient;

/// 기본 ARM 엔드포인트.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
/// 리소스 이동 API 버전.
pub const DEFAULT_API_VERSION: &str = "2021-04-01";

/// ARM 클라이언트 설정.
#[derive(Clone)]
pub struct ArmConfig {
    /// 관리 엔드포인트 (끝의 `/` 제외)
    pub endpoint: String,
    pub api_version: String,
    /// Bearer 토큰
    pub access_token: SecretString,
    /// `Retry-After`가 없을 때의 LRO 폴링 간격
    pub poll_interval: Duration,
    /// LRO 최대 대기 시간
    pub lro_timeout: Duration,
    /// 단일 HTTP 요청 타임아웃
    pub request_timeout: Duration,
}

impl ArmConfig {
    /// 기본값으로 설정 생성.
    pub fn new(access_token: SecretString) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token,
            poll_interval: Duration::from_secs(15),
            lro_timeout: Duration::from_secs(4 * 60 * 60),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// 엔드포인트 변경 (테스트 서버 등).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_lro_timeout(mut self, timeout: Duration) -> Self {
        self.lro_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ArmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("poll_interval", &self.poll_interval)
            .field("lro_timeout", &self.lro_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// ARM 클라이언트 생성 에러.
#[derive(Debug, Error)]
pub enum ArmClientError {
    #[error("잘못된 엔드포인트: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP 클라이언트 생성 실패: {0}")]
    Build(#[from] reqwest::Error),
}
