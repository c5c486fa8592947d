//! CLI 서브커맨드.

pub mod check;
pub mod graph;
pub mod migrate;
pub mod order;
pub mod plan;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use relocator_core::{AssessmentStore, InventorySnapshot, PlanStore};
use relocator_execution::{MemoryStore, PgStore};
use tracing::{debug, info};

use crate::config::{mask_database_url, RelocatorConfig};

/// 스냅샷 JSON 파일 로드. 엣지가 없으면 속성 트리에서 계산합니다.
pub fn load_snapshot(path: &Path) -> anyhow::Result<InventorySnapshot> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("스냅샷 파일을 열 수 없습니다: {}", path.display()))?;
    let mut snapshot: InventorySnapshot = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("스냅샷 파싱 실패: {}", path.display()))?;

    let recorded = snapshot.dependencies.len();
    snapshot.ensure_dependencies();
    debug!(
        resources = snapshot.resources.len(),
        recorded_edges = recorded,
        edges = snapshot.dependencies.len(),
        "스냅샷 로드 완료"
    );
    Ok(snapshot)
}

/// 쉼표로 구분된 리소스 ID 목록 파싱.
pub fn parse_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 저장소 열기 (`DATABASE_URL`이 있으면 PostgreSQL, 없으면 인메모리).
pub async fn open_store(
    config: &RelocatorConfig,
) -> anyhow::Result<(Arc<dyn AssessmentStore>, Arc<dyn PlanStore>)> {
    match &config.database_url {
        Some(url) => {
            info!(database_url = %mask_database_url(url), "PostgreSQL 저장소 사용");
            let store = Arc::new(
                PgStore::connect(url, config.max_concurrent as u32 + 1)
                    .await
                    .context("데이터베이스 연결 실패")?,
            );
            store.ensure_schema().await?;
            let jobs: Arc<dyn AssessmentStore> = store.clone();
            Ok((jobs, store))
        }
        None => {
            debug!("인메모리 저장소 사용");
            let store = Arc::new(MemoryStore::new());
            let jobs: Arc<dyn AssessmentStore> = store.clone();
            Ok((jobs, store))
        }
    }
}

/// 명령 테스트 공용 도우미.
#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;

    use relocator_core::{InventorySnapshot, Resource, ScanResult};
    use relocator_provider::arm::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT};
    use serde_json::json;
    use tempfile::NamedTempFile;

    use crate::config::{ArmSettings, RelocatorConfig, RetrySettings};

    pub const VNET: &str =
        "/subscriptions/sub1/resourceGroups/rg-src/providers/Microsoft.Network/virtualNetworks/vnet1";
    pub const NIC: &str =
        "/subscriptions/sub1/resourceGroups/rg-src/providers/Microsoft.Network/networkInterfaces/nic1";
    pub const TARGET: &str = "/subscriptions/sub1/resourceGroups/rg-dst";

    /// VNET ← NIC 스냅샷을 임시 파일로 기록 (엣지 없이 저장).
    pub fn snapshot_file() -> NamedTempFile {
        let mut snapshot = InventorySnapshot::assemble(
            "sub1",
            ScanResult {
                resource_groups: vec![],
                resources: vec![
                    Resource::new(VNET, "Microsoft.Network/virtualNetworks"),
                    Resource::new(NIC, "Microsoft.Network/networkInterfaces")
                        .with_properties(json!({ "subnet": { "id": VNET } })),
                ],
            },
        );
        snapshot.dependencies.clear();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&snapshot).unwrap().as_bytes())
            .unwrap();
        file
    }

    /// 인메모리 저장소, 토큰 없는 설정.
    pub fn settings() -> RelocatorConfig {
        RelocatorConfig {
            arm: ArmSettings {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_version: DEFAULT_API_VERSION.to_string(),
                access_token: None,
                poll_interval_ms: 15_000,
                lro_timeout_secs: 14_400,
            },
            retry: RetrySettings {
                validate_max_attempts: 3,
                validate_base_delay_ms: 2_000,
                execute_max_attempts: 3,
                execute_base_delay_ms: 4_000,
                max_delay_ms: 10_000,
            },
            max_concurrent: 2,
            database_url: None,
        }
    }
}
