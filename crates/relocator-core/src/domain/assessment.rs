//! 평가 작업 레코드.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InventorySnapshot;

/// 평가 작업 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// 구독 평가 작업.
///
/// 완료된 작업의 인벤토리 스냅샷이 이동 계획의 의존성 검사 기준이 됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentJob {
    pub id: Uuid,
    pub tenant_id: String,
    pub subscription_id: String,
    pub status: JobStatus,
    pub inventory_snapshot: Option<InventorySnapshot>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AssessmentJob {
    /// PENDING 상태의 새 작업.
    pub fn new(tenant_id: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            subscription_id: subscription_id.into(),
            status: JobStatus::Pending,
            inventory_snapshot: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// 이미 확보한 스냅샷으로 완료된 작업 생성.
    pub fn completed(tenant_id: impl Into<String>, snapshot: InventorySnapshot) -> Self {
        let mut job = Self::new(tenant_id, snapshot.subscription_id.clone());
        job.status = JobStatus::Completed;
        job.inventory_snapshot = Some(snapshot);
        job
    }
}
