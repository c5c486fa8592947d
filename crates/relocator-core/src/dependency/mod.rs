//! 리소스 의존성 분석.
//!
//! - [`build_edges`]: 속성 트리에서 리소스 간 참조 엣지 탐지
//! - [`DependencyResolver`]: 누락 의존성 검사 및 이동 순서 계산

mod builder;
mod resolver;

pub use builder::{build_edges, DependencyEdge, PROPERTY_REF};
pub use resolver::{DependencyGraph, DependencyResolver};
