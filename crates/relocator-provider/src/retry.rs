//! 이동 서비스 호출 재시도 유틸리티.
//!
//! 요청 한도 초과, 일시적 장애 등 [`ProviderError::is_retryable`] 오류에 대해서만
//! 지수 백오프로 재시도합니다. 그 외 오류는 즉시 반환합니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use relocator_provider::retry::{RetryConfig, with_retry};
//!
//! let config = RetryConfig::execution();
//! let outcome = with_retry(&config, || async {
//!     executor.execute(&request).await
//! }).await;
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;
use relocator_core::ProviderError;
use tracing::{debug, warn};

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (초기 시도 제외).
    pub max_retries: u32,
    /// 기본 대기 시간 (에러에 지정된 대기 시간이 없을 때 사용).
    pub base_delay: Duration,
    /// 최대 대기 시간.
    pub max_delay: Duration,
    /// 지수 백오프 사용 여부.
    pub use_exponential_backoff: bool,
    /// 백오프 배수 (지수 백오프 시 사용).
    pub backoff_multiplier: f64,
    /// 재시도 시 지터(무작위 지연) 추가 여부.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            use_exponential_backoff: true,
            backoff_multiplier: 2.0,
            add_jitter: false,
        }
    }
}

impl RetryConfig {
    /// 이동 검증 설정 (총 3회, 2초부터 두 배, 최대 10초).
    pub fn validation() -> Self {
        Self::default()
    }

    /// 이동 실행 설정 (총 3회, 4초부터 두 배, 최대 10초).
    pub fn execution() -> Self {
        Self {
            base_delay: Duration::from_secs(4),
            ..Default::default()
        }
    }

    /// 총 시도 횟수 기준 설정. `max_attempts`가 0이면 1회로 취급합니다.
    pub fn from_attempts(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries: max_attempts.saturating_sub(1),
            base_delay,
            max_delay,
            ..Default::default()
        }
    }

    /// 재시도 없음 (단일 시도).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// 총 시도 가능 횟수.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// 대기 시간 계산.
    fn calculate_delay(&self, attempt: u32, error: &ProviderError) -> Duration {
        // 에러에 지정된 대기 시간이 있으면 우선 사용
        let base = error
            .retry_delay_ms()
            .map(Duration::from_millis)
            .unwrap_or(self.base_delay);

        // 지수 백오프 적용 (Duration 변환 전에 상한 적용)
        let delay = if self.use_exponential_backoff && attempt > 0 {
            let multiplier = self.backoff_multiplier.powf(attempt as f64);
            let secs = base.as_secs_f64() * multiplier;
            if secs.is_nan() {
                Duration::ZERO
            } else {
                Duration::from_secs_f64(secs.clamp(0.0, self.max_delay.as_secs_f64()))
            }
        } else {
            base
        };

        // 최대 대기 시간 제한
        let delay = delay.min(self.max_delay);

        // 지터 추가 (±25%)
        if self.add_jitter {
            let jitter_range = delay.as_millis() as f64 * 0.25;
            let jitter = rand::thread_rng().gen_range(-1.0..=1.0) * jitter_range;
            Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
        } else {
            delay
        }
    }
}

/// 재시도 컨텍스트 (콜백에서 현재 시도 정보 접근용).
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// 현재 시도 횟수 (0부터 시작).
    pub attempt: u32,
    /// 최대 재시도 횟수.
    pub max_retries: u32,
    /// 이전 에러 (첫 시도 시 None).
    pub last_error: Option<String>,
}

/// 재시도 결과 통계.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStats {
    /// 총 시도 횟수.
    pub total_attempts: u32,
    /// 총 대기 시간.
    pub total_delay: Duration,
}

/// 재시도 실패 결과 (마지막 에러와 통계).
#[derive(Debug, Clone)]
pub struct RetryFailure {
    pub error: ProviderError,
    pub stats: RetryStats,
}

/// 재시도가 포함된 비동기 작업 실행.
///
/// # Returns
/// * `Ok(T)` - 작업 성공 결과
/// * `Err(ProviderError)` - 재시도 불가 에러 또는 모든 재시도 실패 후 마지막 에러
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    with_retry_context(config, |_| operation())
        .await
        .map(|(result, _)| result)
        .map_err(|failure| failure.error)
}

/// 재시도가 포함된 비동기 작업 실행 (컨텍스트 및 통계 포함).
///
/// 콜백에서 현재 시도 정보에 접근할 수 있습니다.
///
/// # 예시
///
/// ```rust,ignore
/// let (outcome, stats) = with_retry_context(&RetryConfig::validation(), |ctx| async move {
///     if ctx.attempt > 0 {
///         debug!(attempt = ctx.attempt, "재검증");
///     }
///     validator.validate(&request).await
/// }).await?;
/// ```
pub async fn with_retry_context<T, F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<(T, RetryStats), RetryFailure>
where
    F: Fn(RetryContext) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    let mut total_delay = Duration::ZERO;
    let mut last_error: Option<String> = None;

    loop {
        let ctx = RetryContext {
            attempt,
            max_retries: config.max_retries,
            last_error: last_error.clone(),
        };

        match operation(ctx).await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        attempts = attempt + 1,
                        total_delay_ms = total_delay.as_millis(),
                        "재시도 후 성공"
                    );
                }
                let stats = RetryStats {
                    total_attempts: attempt + 1,
                    total_delay,
                };
                return Ok((result, stats));
            }
            Err(e) => {
                let stats = RetryStats {
                    total_attempts: attempt + 1,
                    total_delay,
                };

                // 치명적 에러는 재시도하지 않음
                if e.is_fatal() {
                    warn!(error = %e, "치명적 에러 발생, 재시도 없이 실패 반환");
                    return Err(RetryFailure { error: e, stats });
                }

                // 재시도 가능한 에러가 아니면 즉시 실패
                if !e.is_retryable() {
                    debug!(error = %e, "재시도 불가능한 에러, 즉시 실패 반환");
                    return Err(RetryFailure { error: e, stats });
                }

                // 최대 재시도 횟수 초과
                if attempt >= config.max_retries {
                    warn!(
                        error = %e,
                        attempts = attempt + 1,
                        max_retries = config.max_retries,
                        "최대 재시도 횟수 초과"
                    );
                    return Err(RetryFailure { error: e, stats });
                }

                // 대기 시간 계산 및 대기
                let delay = config.calculate_delay(attempt, &e);
                total_delay += delay;

                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "재시도 대기 중"
                );

                last_error = Some(e.to_string());
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
