//! 마이그레이션 계획 레코드와 상태 머신.
//!
//! ```text
//! PENDING → VALIDATING → MOVING → COMPLETED
//!                      ↘         ↘ FAILED
//!         ↘ FAILED_VALIDATION      (any) → CRASHED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::MoveRequest;

/// 계획 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// 이동 요청 접수, 실행 대기
    Pending,
    /// 의존성 검사 및 프로바이더 검증 중
    Validating,
    /// 프로바이더 이동 실행 중
    Moving,
    /// 이동 완료
    Completed,
    /// 검증 실패 (의존성 누락 또는 프로바이더 거부)
    FailedValidation,
    /// 이동 실행 실패
    Failed,
    /// 처리되지 않은 내부 오류로 강제 종료
    Crashed,
}

impl PlanStatus {
    /// 종료 상태 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanStatus::Completed
                | PlanStatus::FailedValidation
                | PlanStatus::Failed
                | PlanStatus::Crashed
        )
    }

    /// 정상 경로의 전이 허용 여부.
    ///
    /// CRASHED는 [`MigrationPlan::crash`]로만 강제됩니다.
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (PlanStatus::Pending, PlanStatus::Validating)
                | (PlanStatus::Validating, PlanStatus::Moving)
                | (PlanStatus::Validating, PlanStatus::FailedValidation)
                | (PlanStatus::Moving, PlanStatus::Completed)
                | (PlanStatus::Moving, PlanStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "PENDING",
            PlanStatus::Validating => "VALIDATING",
            PlanStatus::Moving => "MOVING",
            PlanStatus::Completed => "COMPLETED",
            PlanStatus::FailedValidation => "FAILED_VALIDATION",
            PlanStatus::Failed => "FAILED",
            PlanStatus::Crashed => "CRASHED",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(PlanStatus::Pending),
            "VALIDATING" => Ok(PlanStatus::Validating),
            "MOVING" => Ok(PlanStatus::Moving),
            "COMPLETED" => Ok(PlanStatus::Completed),
            "FAILED_VALIDATION" => Ok(PlanStatus::FailedValidation),
            "FAILED" => Ok(PlanStatus::Failed),
            "CRASHED" => Ok(PlanStatus::Crashed),
            _ => Err(format!("Invalid plan status: {}", s)),
        }
    }
}

/// 실행 로그 (`{status: "success"}` 또는 `{error: message}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLog {
    pub fn success() -> Self {
        Self {
            status: Some("success".to_string()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// 허용되지 않은 상태 전이.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("허용되지 않은 상태 전이: {from} → {to}")]
pub struct PlanTransitionError {
    pub from: PlanStatus,
    pub to: PlanStatus,
}

/// 마이그레이션 계획.
///
/// Plan Store가 소유하며 오케스트레이터만 변경합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub id: Uuid,
    /// 원본 평가 작업
    pub job_id: Uuid,
    pub subscription_id: String,
    /// 원본 리소스 그룹 이름
    pub source_group: String,
    /// 대상 리소스 그룹 ID
    pub target_group_id: String,
    /// 이동 대상 리소스 ID
    pub batch: Vec<String>,
    pub status: PlanStatus,
    pub execution_log: Option<ExecutionLog>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MigrationPlan {
    /// PENDING 상태의 새 계획 생성.
    pub fn new(
        job_id: Uuid,
        subscription_id: impl Into<String>,
        source_group: impl Into<String>,
        target_group_id: impl Into<String>,
        batch: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            subscription_id: subscription_id.into(),
            source_group: source_group.into(),
            target_group_id: target_group_id.into(),
            batch,
            status: PlanStatus::Pending,
            execution_log: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 상태 전이 (정상 경로).
    pub fn transition(&mut self, next: PlanStatus) -> Result<(), PlanTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(PlanTransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 종료 상태로 전이하면서 실행 로그 기록.
    pub fn finish(
        &mut self,
        terminal: PlanStatus,
        log: ExecutionLog,
    ) -> Result<(), PlanTransitionError> {
        self.transition(terminal)?;
        self.execution_log = Some(log);
        Ok(())
    }

    /// 현재 상태와 무관하게 CRASHED로 강제.
    pub fn crash(&mut self, message: impl Into<String>) {
        self.status = PlanStatus::Crashed;
        self.execution_log = Some(ExecutionLog::error(message));
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 프로바이더 호출용 요청.
    pub fn move_request(&self) -> MoveRequest {
        MoveRequest {
            subscription_id: self.subscription_id.clone(),
            source_group: self.source_group.clone(),
            target_group_id: self.target_group_id.clone(),
            resource_ids: self.batch.clone(),
        }
    }
}
