//! 이동 순서 출력 명령.

use std::path::PathBuf;

use relocator_core::{DependencyResolver, InventorySnapshot};
use tracing::warn;

use super::load_snapshot;

/// order 명령 설정
#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub snapshot: PathBuf,
    pub ids: Vec<String>,
}

/// 의존 대상이 먼저 오는 이동 순서 출력
pub fn run_order(config: &OrderConfig) -> anyhow::Result<String> {
    let snapshot = load_snapshot(&config.snapshot)?;
    Ok(render_order(&snapshot, &config.ids))
}

/// 순서 목록을 번호와 함께 렌더링. 스냅샷에 없는 ID는 경고 후 제외됩니다.
pub fn render_order(snapshot: &InventorySnapshot, ids: &[String]) -> String {
    let resolver = DependencyResolver::from_snapshot(snapshot);

    for id in ids.iter().filter(|id| !resolver.contains(id)) {
        warn!(resource_id = %id, "스냅샷에 없는 리소스는 순서 계산에서 제외됩니다");
    }

    resolver
        .topological_order(ids)
        .iter()
        .enumerate()
        .map(|(index, resource)| format!("{:>3}. {}\n", index + 1, resource.id))
        .collect()
}
