//! 속성 트리 기반 의존성 엣지 탐지.
//!
//! 각 리소스의 속성 트리를 재귀적으로 순회하면서 `id` 또는 `...Id` 키에
//! 다른 리소스의 ID가 문자열로 들어 있으면 참조로 간주합니다.
//!
//! 이름, 태그, 외부 채널로만 표현된 의존성은 탐지하지 못하며, 무관한 속성 값이
//! 우연히 다른 리소스 ID와 같으면 잘못된 엣지가 생길 수 있습니다.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Resource;
use crate::ids::canonical_id;

/// 속성 참조 관계 종류.
pub const PROPERTY_REF: &str = "property_ref";

/// 리소스 간 의존성 엣지 (source가 target에 의존).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// 의존하는 리소스 ID
    pub source: String,
    /// 의존 대상 리소스 ID (속성에 기록된 원문 그대로)
    pub target: String,
    /// 관계 종류
    #[serde(default = "default_relation")]
    pub relation: String,
}

impl DependencyEdge {
    /// 속성 참조 엣지 생성.
    pub fn property_ref(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: PROPERTY_REF.to_string(),
        }
    }
}

fn default_relation() -> String {
    PROPERTY_REF.to_string()
}

/// 리소스 목록에서 의존성 엣지 목록 생성.
///
/// 부작용 없는 순수 함수입니다. 자기 참조와 알 수 없는 대상은 제외됩니다.
pub fn build_edges(resources: &[Resource]) -> Vec<DependencyEdge> {
    let known_ids: HashSet<String> = resources.iter().map(|r| canonical_id(&r.id)).collect();
    let mut edges = Vec::new();

    for resource in resources {
        let scan = ReferenceScan {
            source_id: &resource.id,
            source_key: canonical_id(&resource.id),
            known_ids: &known_ids,
        };
        scan.walk(&resource.properties, &mut edges);
    }

    edges
}

struct ReferenceScan<'a> {
    source_id: &'a str,
    source_key: String,
    known_ids: &'a HashSet<String>,
}

impl ReferenceScan<'_> {
    fn walk(&self, node: &Value, edges: &mut Vec<DependencyEdge>) {
        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::String(candidate) if is_reference_key(key) => {
                            self.check_reference(candidate, edges);
                        }
                        _ => self.walk(value, edges),
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, edges);
                }
            }
            _ => {}
        }
    }

    fn check_reference(&self, candidate: &str, edges: &mut Vec<DependencyEdge>) {
        let key = canonical_id(candidate);
        if key != self.source_key && self.known_ids.contains(&key) {
            edges.push(DependencyEdge::property_ref(self.source_id, candidate));
        }
    }
}

/// `id` (대소문자 무시) 또는 `Id`로 끝나는 키.
fn is_reference_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("id") || key.ends_with("Id")
}
