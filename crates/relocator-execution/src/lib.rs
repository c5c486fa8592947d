//! 마이그레이션 실행 및 계획 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 검증/실행/재시도를 조율하는 마이그레이션 오케스트레이터
//! - 동시 실행 수를 제한하는 백그라운드 디스패처
//! - 이동 요청 접수 및 평가 작업 실행 서비스
//! - 인메모리, PostgreSQL 저장소
//!
//! # 예제
//!
//! ```rust,ignore
//! use relocator_execution::{MigrationDispatcher, MigrationOrchestrator, MigrationService};
//!
//! let orchestrator = Arc::new(MigrationOrchestrator::new(validator, executor, store.clone()));
//! let dispatcher = MigrationDispatcher::new(orchestrator, 4);
//! let service = MigrationService::new(store.clone(), store, dispatcher);
//! let accepted = service.submit(request).await?;
//! ```

pub mod assessment;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod store;

// 주요 타입 재내보내기
pub use assessment::AssessmentRunner;
pub use dispatcher::MigrationDispatcher;
pub use error::{MissingDependencies, OrchestrationError, ServiceError};
pub use orchestrator::{check_dependencies, MigrationOrchestrator, OrchestratorConfig};
pub use service::{MigrationAccepted, MigrationRequest, MigrationService};
pub use store::{MemoryStore, PgStore};
