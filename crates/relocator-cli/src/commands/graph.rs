//! 의존성 그래프 출력 명령.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use relocator_core::{canonical_id, DependencyResolver, InventorySnapshot};

use super::load_snapshot;

/// 그래프 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// Mermaid 다이어그램
    Mermaid,
    /// DOT (Graphviz)
    Dot,
    /// 텍스트
    Text,
}

impl GraphFormat {
    /// 문자열에서 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mermaid" | "md" => Some(Self::Mermaid),
            "dot" | "graphviz" => Some(Self::Dot),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// graph 명령 설정
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub snapshot: PathBuf,
    pub format: GraphFormat,
}

/// 의존성 그래프 출력
pub fn run_graph(config: &GraphConfig) -> anyhow::Result<String> {
    let snapshot = load_snapshot(&config.snapshot)?;
    Ok(render(&snapshot, config.format))
}

/// 스냅샷을 지정 형식으로 렌더링.
pub fn render(snapshot: &InventorySnapshot, format: GraphFormat) -> String {
    let resolver = DependencyResolver::from_snapshot(snapshot);
    let nodes = Nodes::collect(snapshot);

    match format {
        GraphFormat::Mermaid => generate_mermaid_graph(&resolver, &nodes),
        GraphFormat::Dot => generate_dot_graph(&resolver, &nodes),
        GraphFormat::Text => generate_text_graph(&resolver, &nodes),
    }
}

/// 정규화 ID 순으로 정렬된 노드 목록 (정규화 ID → 표시 이름).
struct Nodes {
    labels: BTreeMap<String, String>,
    /// 정규화 ID → 다이어그램 노드 번호
    keys: HashMap<String, usize>,
}

impl Nodes {
    fn collect(snapshot: &InventorySnapshot) -> Self {
        let labels: BTreeMap<String, String> = snapshot
            .resources
            .iter()
            .map(|r| {
                let label = if r.name.is_empty() {
                    r.id.clone()
                } else {
                    format!("{} ({})", r.name, r.resource_type)
                };
                (canonical_id(&r.id), label)
            })
            .collect();
        let keys = labels
            .keys()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();
        Self { labels, keys }
    }

    fn key(&self, id: &str) -> String {
        format!("n{}", self.keys.get(id).copied().unwrap_or_default())
    }

    fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// Mermaid 다이어그램 생성
fn generate_mermaid_graph(resolver: &DependencyResolver, nodes: &Nodes) -> String {
    let mut output = String::new();

    output.push_str("```mermaid\n");
    output.push_str("graph LR\n");
    output.push_str("    subgraph \"리소스 의존성\"\n");

    for (index, label) in nodes.labels.values().enumerate() {
        output.push_str(&format!(
            "        n{}[\"{}\"]\n",
            index,
            label.replace('"', "'")
        ));
    }

    for (source, target) in resolver.graph().edges() {
        output.push_str(&format!(
            "        {} --> {}\n",
            nodes.key(source),
            nodes.key(target)
        ));
    }

    output.push_str("    end\n");
    output.push_str("```\n");

    output
}

/// DOT 그래프 생성
fn generate_dot_graph(resolver: &DependencyResolver, nodes: &Nodes) -> String {
    let mut output = String::new();

    output.push_str("digraph ResourceDependencies {\n");
    output.push_str("    rankdir=LR;\n");
    output.push_str("    node [shape=box];\n\n");

    for (id, label) in &nodes.labels {
        output.push_str(&format!("    \"{}\" [label=\"{}\"];\n", id, label));
    }
    output.push('\n');

    for (source, target) in resolver.graph().edges() {
        output.push_str(&format!("    \"{}\" -> \"{}\";\n", source, target));
    }

    output.push_str("}\n");

    output
}

/// 텍스트 그래프 생성
fn generate_text_graph(resolver: &DependencyResolver, nodes: &Nodes) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str("                      리소스 의존성 그래프\n");
    output.push_str("═══════════════════════════════════════════════════════════════\n\n");

    output.push_str(&format!(
        "리소스 {}개, 의존성 {}개\n",
        resolver.node_count(),
        resolver.edge_count()
    ));
    output.push_str("───────────────────────────────────────────────────────────────\n");

    for id in nodes.labels.keys() {
        output.push_str(&format!("\n{}\n", nodes.label(id)));

        let deps = resolver.dependencies_of(id);
        if deps.is_empty() {
            output.push_str("  └── (의존성 없음)\n");
        } else {
            for dep in deps {
                output.push_str(&format!("  └── {}\n", nodes.label(dep)));
            }
        }
    }

    output
}
