//! 리소스 그룹 마이그레이션 핵심 타입.
//!
//! 이 crate는 다음을 제공합니다:
//! - 인벤토리 스냅샷, 마이그레이션 계획 등 도메인 모델
//! - 속성 참조 기반 의존성 그래프 생성 및 질의
//! - 이동 프로바이더, 인벤토리 스캐너, 저장소 인터페이스
//!
//! # 예제
//!
//! ```rust,ignore
//! use relocator_core::{DependencyResolver, InventorySnapshot};
//!
//! let resolver = DependencyResolver::from_snapshot(&snapshot);
//! let missing = resolver.missing_dependencies(&batch);
//! let order = resolver.topological_order(&batch);
//! ```

pub mod dependency;
pub mod domain;
pub mod ids;

// 주요 타입 재내보내기
pub use dependency::{build_edges, DependencyEdge, DependencyGraph, DependencyResolver};
pub use domain::*;
pub use ids::{canonical_id, resource_group_of, subscription_of};
