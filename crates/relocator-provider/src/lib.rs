//! 리소스 이동 프로바이더 커넥터.
//!
//! - [`retry`]: 일시적 오류 재시도 및 지수 백오프
//! - [`arm`]: Azure Resource Manager 검증/이동 클라이언트
//! - [`scripted`]: 대본 기반 인메모리 프로바이더

pub mod arm;
pub mod retry;
pub mod scripted;

pub use arm::{ArmClientError, ArmConfig, ArmMoveClient};
pub use retry::{
    with_retry, with_retry_context, RetryConfig, RetryContext, RetryFailure, RetryStats,
};
pub use scripted::ScriptedMoveProvider;
