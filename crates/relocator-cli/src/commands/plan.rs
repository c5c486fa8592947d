//! 저장된 계획 조회 명령.

use anyhow::bail;
use relocator_core::StoreError;
use uuid::Uuid;

use super::open_store;
use crate::config::RelocatorConfig;

/// 계획 레코드를 JSON으로 반환. PostgreSQL 저장소에서만 의미가 있습니다.
pub async fn run_plan(plan_id: Uuid, settings: &RelocatorConfig) -> anyhow::Result<String> {
    if settings.database_url.is_none() {
        bail!("plan 조회에는 DATABASE_URL이 필요합니다");
    }

    let (_, plans) = open_store(settings).await?;
    let plan = plans
        .load_plan(plan_id)
        .await?
        .ok_or(StoreError::NotFound(plan_id))?;
    Ok(serde_json::to_string_pretty(&plan)?)
}
