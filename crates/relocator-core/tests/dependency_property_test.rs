//! 의존성 그래프 불변식 property 테스트.

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use proptest::sample::Index;
use relocator_core::{build_edges, canonical_id, DependencyEdge, DependencyResolver, Resource};
use serde_json::json;

// ============================================================================
// 생성기
// ============================================================================

/// 무작위 이름의 리소스 ID 목록.
fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{3,8}", 1..12).prop_map(|names| {
        names
            .into_iter()
            .map(|name| format!("/subscriptions/s/resourceGroups/rg/providers/T/x/{}", name))
            .collect()
    })
}

/// 순환 없는 그래프: 엣지는 항상 인덱스가 큰 쪽이 작은 쪽에 의존.
fn arb_dag() -> impl Strategy<Value = (Vec<String>, Vec<DependencyEdge>)> {
    (arb_ids(), prop::collection::vec((any::<Index>(), any::<Index>()), 0..30)).prop_map(
        |(ids, pairs)| {
            let edges = pairs
                .into_iter()
                .filter_map(|(a, b)| {
                    let (a, b) = (a.index(ids.len()), b.index(ids.len()));
                    (a != b).then(|| {
                        DependencyEdge::property_ref(&ids[a.max(b)], &ids[a.min(b)].to_uppercase())
                    })
                })
                .collect();
            (ids, edges)
        },
    )
}

fn resources(ids: &[String]) -> Vec<Resource> {
    ids.iter().map(|id| Resource::new(id.clone(), "test")).collect()
}

// ============================================================================
// 속성
// ============================================================================

proptest! {
    #[test]
    fn topological_order_is_permutation_respecting_edges(
        (ids, edges) in arb_dag(),
        mask in prop::collection::vec(any::<bool>(), 12),
    ) {
        let resolver = DependencyResolver::new(&resources(&ids), &edges);
        let mut subset: Vec<String> = ids
            .iter()
            .zip(mask.iter())
            .filter(|(_, keep)| **keep)
            .map(|(id, _)| id.clone())
            .collect();
        subset.push("/subscriptions/s/unknown".to_string());

        let order = resolver.topological_order(&subset);
        let position: HashMap<String, usize> = order
            .iter()
            .enumerate()
            .map(|(i, r)| (canonical_id(&r.id), i))
            .collect();

        let expected: BTreeSet<String> = subset
            .iter()
            .map(|id| canonical_id(id))
            .filter(|id| resolver.contains(id))
            .collect();
        let actual: BTreeSet<String> = position.keys().cloned().collect();
        prop_assert_eq!(order.len(), expected.len());
        prop_assert_eq!(actual, expected);

        for edge in &edges {
            let (dependent, dependency) = (canonical_id(&edge.source), canonical_id(&edge.target));
            if let (Some(a), Some(b)) = (position.get(&dependent), position.get(&dependency)) {
                prop_assert!(b < a, "{} must precede {}", dependency, dependent);
            }
        }
    }

    #[test]
    fn topological_order_is_deterministic((ids, edges) in arb_dag()) {
        let forward = DependencyResolver::new(&resources(&ids), &edges);
        let mut reversed_ids = ids.clone();
        reversed_ids.reverse();
        let reversed = DependencyResolver::new(&resources(&reversed_ids), &edges);

        let first: Vec<String> = forward.topological_order(&ids).iter().map(|r| r.id.clone()).collect();
        let again: Vec<String> = forward.topological_order(&ids).iter().map(|r| r.id.clone()).collect();
        let other: Vec<String> =
            reversed.topological_order(&reversed_ids).iter().map(|r| r.id.clone()).collect();

        prop_assert_eq!(&first, &again);
        prop_assert_eq!(&first, &other);
    }

    #[test]
    fn missing_dependencies_empty_for_none_and_all((ids, edges) in arb_dag()) {
        let resolver = DependencyResolver::new(&resources(&ids), &edges);
        let none: Vec<String> = Vec::new();
        prop_assert!(resolver.missing_dependencies(&none).is_empty());
        prop_assert!(resolver.missing_dependencies(&ids).is_empty());
    }

    #[test]
    fn builder_never_emits_self_or_unknown_targets(
        ids in arb_ids(),
        picks in prop::collection::vec((any::<Index>(), any::<Index>(), any::<bool>()), 0..20),
    ) {
        let mut resources = resources(&ids);
        for (owner, target, junk) in picks {
            let owner = owner.index(ids.len());
            let value = if junk {
                format!("{}-not-a-resource", ids[target.index(ids.len())])
            } else {
                ids[target.index(ids.len())].to_uppercase()
            };
            let properties = resources[owner].properties.clone();
            resources[owner].properties = json!({
                "nested": [properties, { "linkedId": value }]
            });
        }

        let known: BTreeSet<String> = ids.iter().map(|id| canonical_id(id)).collect();
        for edge in build_edges(&resources) {
            prop_assert_ne!(canonical_id(&edge.source), canonical_id(&edge.target));
            prop_assert!(known.contains(&canonical_id(&edge.target)));
        }
    }
}
