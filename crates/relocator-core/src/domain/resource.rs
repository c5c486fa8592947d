//! 인벤토리 스냅샷 모델.
//!
//! 스캐너가 구독을 조회한 결과를 그대로 담는 불변 스냅샷입니다.
//! JSON 키는 스캐너 출력 형식과 동일하게 유지합니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dependency::{build_edges, DependencyEdge};
use crate::ids::resource_group_of;

/// 스캔된 단일 클라우드 리소스.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// 리소스 ID (대소문자 무시 비교)
    pub id: String,
    /// 리소스 이름
    #[serde(default)]
    pub name: String,
    /// 리소스 유형 (예: Microsoft.Compute/virtualMachines)
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// 리전
    #[serde(default)]
    pub location: Option<String>,
    /// SKU (원본 JSON)
    #[serde(default)]
    pub sku: Option<Value>,
    /// 리소스 kind
    #[serde(default)]
    pub kind: Option<String>,
    /// 태그
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
    /// 소속 리소스 그룹
    #[serde(default)]
    pub resource_group: Option<String>,
    /// 중첩 속성 트리
    #[serde(default = "empty_object", deserialize_with = "null_as_empty_object")]
    pub properties: Value,
}

impl Resource {
    /// 최소 필드로 리소스 생성.
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let id = id.into();
        let name = id.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            resource_group: resource_group_of(&id).map(str::to_string),
            id,
            name,
            resource_type: resource_type.into(),
            location: None,
            sku: None,
            kind: None,
            tags: BTreeMap::new(),
            properties: empty_object(),
        }
    }

    /// 속성 트리 설정.
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// 리전 설정.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// 태그 추가.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// 리소스 그룹 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
}

/// 인벤토리 스캐너 원시 결과.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub resource_groups: Vec<ResourceGroupInfo>,
    pub resources: Vec<Resource>,
}

/// 구독 단위 인벤토리 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub subscription_id: String,
    #[serde(default)]
    pub resource_groups: Vec<ResourceGroupInfo>,
    #[serde(default)]
    pub total_resources: usize,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// 속성 참조로 탐지된 의존성 엣지
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

impl InventorySnapshot {
    /// 스캔 결과로 스냅샷 조립.
    ///
    /// 리소스 그룹이 비어 있는 리소스는 ID에서 그룹을 추출해 채우고,
    /// 의존성 엣지를 새로 계산합니다.
    pub fn assemble(subscription_id: impl Into<String>, scan: ScanResult) -> Self {
        let mut resources = scan.resources;
        for resource in &mut resources {
            if resource.resource_group.is_none() {
                resource.resource_group = resource_group_of(&resource.id).map(str::to_string);
            }
        }

        let dependencies = build_edges(&resources);
        debug!(
            resources = resources.len(),
            edges = dependencies.len(),
            "인벤토리 스냅샷 조립"
        );

        Self {
            subscription_id: subscription_id.into(),
            resource_groups: scan.resource_groups,
            total_resources: resources.len(),
            resources,
            dependencies,
        }
    }

    /// 엣지가 비어 있으면 속성 트리에서 다시 계산.
    pub fn ensure_dependencies(&mut self) {
        if self.dependencies.is_empty() {
            self.dependencies = build_edges(&self.resources);
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_object<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .filter(|value| !value.is_null())
        .unwrap_or_else(empty_object))
}
