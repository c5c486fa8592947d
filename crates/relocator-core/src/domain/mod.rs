//! 도메인 모델 및 외부 협력자 인터페이스.

mod assessment;
mod move_provider;
mod plan;
mod resource;
mod store;

pub use assessment::{AssessmentJob, JobStatus};
pub use move_provider::{
    ExecutionOutcome, InventoryScanner, MoveExecutor, MoveRequest, MoveValidator, ProviderError,
    TransientKind, ValidationOutcome,
};
pub use plan::{ExecutionLog, MigrationPlan, PlanStatus, PlanTransitionError};
pub use resource::{InventorySnapshot, Resource, ResourceGroupInfo, ScanResult};
pub use store::{AssessmentStore, PlanStore, StoreError};
