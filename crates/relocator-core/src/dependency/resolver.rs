//! 의존성 그래프 질의.
//!
//! 평가 스냅샷마다 한 번 생성되며 이후 변경되지 않습니다.
//! 모든 질의는 순수 인메모리 연산이고, 알 수 없는 ID는 오류 없이 무시합니다.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::dependency::DependencyEdge;
use crate::domain::{InventorySnapshot, Resource};
use crate::ids::canonical_id;

/// 정규화 ID 기반 인접 그래프.
///
/// `adjacency[a]`는 `a`가 의존하는 노드 집합이며, 모든 대상은 그래프의 노드입니다.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    fn build(node_ids: impl IntoIterator<Item = String>, edges: &[DependencyEdge]) -> Self {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> =
            node_ids.into_iter().map(|id| (id, BTreeSet::new())).collect();

        for edge in edges {
            let source = canonical_id(&edge.source);
            let target = canonical_id(&edge.target);
            if source == target || !adjacency.contains_key(&target) {
                continue;
            }
            if let Some(deps) = adjacency.get_mut(&source) {
                deps.insert(target);
            }
        }

        Self { adjacency }
    }

    /// 노드 존재 여부 (정규화 ID).
    pub fn contains(&self, key: &str) -> bool {
        self.adjacency.contains_key(key)
    }

    /// 직접 의존 대상.
    pub fn neighbors(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }

    /// (의존하는 노드, 의존 대상) 쌍을 정렬 순서로 순회.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency
            .iter()
            .flat_map(|(source, deps)| deps.iter().map(move |dep| (source.as_str(), dep.as_str())))
    }
}

/// 의존성 해석기.
///
/// 누락 의존성 검사와 이동 순서 계산을 담당합니다.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    resources: HashMap<String, Resource>,
    graph: DependencyGraph,
}

impl DependencyResolver {
    /// 리소스와 엣지로 해석기 생성.
    pub fn new(resources: &[Resource], edges: &[DependencyEdge]) -> Self {
        let resources: HashMap<String, Resource> = resources
            .iter()
            .map(|r| (canonical_id(&r.id), r.clone()))
            .collect();
        let graph = DependencyGraph::build(resources.keys().cloned(), edges);

        Self { resources, graph }
    }

    /// 스냅샷에 기록된 엣지로 해석기 생성.
    pub fn from_snapshot(snapshot: &InventorySnapshot) -> Self {
        Self::new(&snapshot.resources, &snapshot.dependencies)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// 스냅샷에 포함된 리소스인지 확인.
    pub fn contains(&self, id: &str) -> bool {
        self.graph.contains(&canonical_id(id))
    }

    /// 정규화 ID로 리소스 조회.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(&canonical_id(id))
    }

    /// 직접 의존 대상 목록 (정규화 ID, 정렬됨).
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.graph
            .neighbors(&canonical_id(id))
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// 선택 배치에 빠진 직접 의존 대상.
    ///
    /// 한 단계(직접 이웃)만 검사합니다. 의존 대상의 의존 대상은 해당 대상을
    /// 선택에 추가한 뒤 다시 검사해야 드러납니다.
    pub fn missing_dependencies<S: AsRef<str>>(&self, selected: &[S]) -> BTreeSet<String> {
        let selected: BTreeSet<String> =
            selected.iter().map(|id| canonical_id(id.as_ref())).collect();

        selected
            .iter()
            .filter_map(|id| self.graph.neighbors(id))
            .flatten()
            .filter(|dep| !selected.contains(*dep))
            .cloned()
            .collect()
    }

    /// 의존 대상이 먼저 오는 이동 순서.
    ///
    /// 알 수 없는 ID는 제외됩니다. 순환이 있어도 각 노드는 한 번만 방문하므로
    /// 종료되지만, 순환 구성원 사이의 순서는 보장되지 않습니다.
    pub fn topological_order<S: AsRef<str>>(&self, subset: &[S]) -> Vec<&Resource> {
        let subset: BTreeSet<String> = subset
            .iter()
            .map(|id| canonical_id(id.as_ref()))
            .filter(|key| self.graph.contains(key))
            .collect();

        let mut visited = BTreeSet::new();
        let mut order = Vec::with_capacity(subset.len());

        for key in &subset {
            if !visited.contains(key.as_str()) {
                self.visit(key, &subset, &mut visited, &mut order);
            }
        }

        order
            .into_iter()
            .filter_map(|key| self.resources.get(key))
            .collect()
    }

    fn visit<'a>(
        &'a self,
        key: &'a str,
        subset: &BTreeSet<String>,
        visited: &mut BTreeSet<&'a str>,
        order: &mut Vec<&'a str>,
    ) {
        visited.insert(key);

        if let Some(deps) = self.graph.neighbors(key) {
            for dep in deps {
                if subset.contains(dep) && !visited.contains(dep.as_str()) {
                    self.visit(dep, subset, visited, order);
                }
            }
        }

        order.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(ids: &[&str]) -> Vec<Resource> {
        ids.iter().map(|id| Resource::new(*id, "test")).collect()
    }

    fn ids(order: &[&Resource]) -> Vec<String> {
        order.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_dangling_and_self_edges_dropped() {
        let resolver = DependencyResolver::new(
            &resources(&["a", "b"]),
            &[
                DependencyEdge::property_ref("a", "b"),
                DependencyEdge::property_ref("a", "ghost"),
                DependencyEdge::property_ref("ghost", "a"),
                DependencyEdge::property_ref("b", "B"),
            ],
        );

        assert_eq!(resolver.graph().node_count(), 2);
        assert_eq!(resolver.graph().edge_count(), 1);
        assert_eq!(resolver.dependencies_of("A"), vec!["b"]);
    }

    #[test]
    fn test_missing_is_direct_only() {
        let resolver = DependencyResolver::new(
            &resources(&["vnet1", "nic1", "vm1"]),
            &[
                DependencyEdge::property_ref("nic1", "vnet1"),
                DependencyEdge::property_ref("vm1", "nic1"),
            ],
        );

        let missing = resolver.missing_dependencies(&["VM1"]);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["nic1"]);

        let missing = resolver.missing_dependencies(&["vm1", "nic1"]);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["vnet1"]);
    }

    #[test]
    fn test_unknown_ids_silently_dropped() {
        let resolver = DependencyResolver::new(&resources(&["a"]), &[]);
        assert!(resolver.missing_dependencies(&["zzz"]).is_empty());
        assert_eq!(ids(&resolver.topological_order(&["zzz", "A"])), vec!["a"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let resolver = DependencyResolver::new(
            &resources(&["a", "b", "c"]),
            &[
                DependencyEdge::property_ref("a", "b"),
                DependencyEdge::property_ref("b", "c"),
                DependencyEdge::property_ref("c", "a"),
            ],
        );

        let order = resolver.topological_order(&["a", "b", "c"]);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_order_ignores_edges_leaving_subset() {
        let resolver = DependencyResolver::new(
            &resources(&["a", "b", "c"]),
            &[
                DependencyEdge::property_ref("a", "c"),
                DependencyEdge::property_ref("c", "b"),
            ],
        );

        // c가 부분집합 밖이므로 a와 b 사이에는 제약이 없음 → 정렬 순서
        assert_eq!(ids(&resolver.topological_order(&["b", "a"])), vec!["a", "b"]);
    }
}
