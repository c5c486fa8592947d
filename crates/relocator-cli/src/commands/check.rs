//! 누락 의존성 검사 명령.

use std::path::PathBuf;

use anyhow::bail;
use relocator_core::DependencyResolver;
use relocator_execution::MissingDependencies;
use tracing::info;

use super::load_snapshot;

/// check 명령 설정
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub snapshot: PathBuf,
    pub ids: Vec<String>,
}

/// 선택 배치의 직접 의존 대상 중 빠진 것을 출력합니다.
///
/// 누락이 있으면 에러를 반환하여 프로세스가 0이 아닌 코드로 종료됩니다.
pub fn run_check(config: &CheckConfig) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&config.snapshot)?;
    let resolver = DependencyResolver::from_snapshot(&snapshot);
    let missing = resolver.missing_dependencies(&config.ids);

    if missing.is_empty() {
        info!(selected = config.ids.len(), "누락된 의존성 없음");
        println!("✅ 누락된 의존성이 없습니다 ({}개 선택)", config.ids.len());
        return Ok(());
    }

    println!("❌ 누락된 의존성 {}개", missing.len());
    for id in &missing {
        println!("  └── {}", id);
    }
    bail!(MissingDependencies { missing })
}
