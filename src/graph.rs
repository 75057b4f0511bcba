//! Dependency graph planning.
//!
//! The planner turns configured units and build directives into a typed node
//! set, resolves the loose library spellings users write (`core`, `core.so`,
//! `lib/core`) against an alias table, and orders the nodes so every
//! dependency is built before its dependents. It performs no filesystem
//! writes; [`preview`] exposes the same result as a serializable projection
//! for `cf plan`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::config::{BuildConfig, BuildDirective};
use crate::errors::BuildError;
use crate::toolchain::shared_extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SharedLibrary,
    Executable,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::SharedLibrary => write!(f, "shared_library"),
            NodeKind::Executable => write!(f, "executable"),
        }
    }
}

/// Where a node came from; indices point into the owning [`BuildConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    ConfiguredShared(usize),
    Directive(usize),
    ConfiguredTool(usize),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub raw_dependencies: Vec<String>,
    /// Resolved node ids, deduplicated, insertion order preserved.
    pub dependencies: Vec<String>,
    pub origin: NodeOrigin,
    pub output_path: PathBuf,
}

/// The planned build graph. `order` is a topological sort of `nodes`;
/// `unresolved` maps node ids to dependency tokens that matched no alias.
#[derive(Debug)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub index: HashMap<String, usize>,
    pub order: Vec<String>,
    pub unresolved: BTreeMap<String, Vec<String>>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeSummary {
                    id: n.id.clone(),
                    kind: n.kind,
                    output: n.output_path.display().to_string(),
                    raw_dependencies: n.raw_dependencies.clone(),
                    dependencies: n.dependencies.clone(),
                })
                .collect(),
            order: self.order.clone(),
            unresolved: self.unresolved.clone(),
        }
    }
}

/// Serializable projection of a [`Graph`] for `cf plan`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub nodes: Vec<NodeSummary>,
    pub order: Vec<String>,
    pub unresolved: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub kind: NodeKind,
    pub output: String,
    pub raw_dependencies: Vec<String>,
    pub dependencies: Vec<String>,
}

pub fn shared_id(name: &str) -> String {
    format!("shared:{name}")
}

pub fn directive_id(unit: &str) -> String {
    format!("directive:{unit}")
}

pub fn tool_id(name: &str) -> String {
    format!("tool:{name}")
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Plan the build graph for `config`.
pub fn plan(config: &BuildConfig) -> Result<Graph, BuildError> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    // Alias table: first registration wins, collisions are skipped.
    let mut aliases: HashMap<String, String> = HashMap::new();

    let ext = shared_extension();

    for (i, lib) in config.shared_libs.iter().enumerate() {
        if lib.sources.is_empty() {
            println!(
                "{} shared library '{}' has no sources, skipping",
                "!".yellow(),
                lib.name
            );
            continue;
        }
        let id = shared_id(&lib.name);
        add_node(
            &mut nodes,
            &mut index,
            Node {
                id: id.clone(),
                kind: NodeKind::SharedLibrary,
                raw_dependencies: lib.libraries.clone(),
                dependencies: Vec::new(),
                origin: NodeOrigin::ConfiguredShared(i),
                output_path: lib.output_dir.join(format!("{}.{ext}", lib.name)),
            },
        )?;
        for alias in [
            lib.name.clone(),
            format!("lib/{}", lib.name),
            format!("{}.so", lib.name),
            format!("lib/{}.so", lib.name),
        ] {
            aliases.entry(alias).or_insert_with(|| id.clone());
        }
    }

    for (i, directive) in config.directives.iter().enumerate() {
        let id = directive_id(&directive.unit_name);
        let kind = if directive.is_shared {
            NodeKind::SharedLibrary
        } else {
            NodeKind::Executable
        };
        let segment = last_segment(&directive.unit_name);
        let output_path = directive_output(config, directive);
        add_node(
            &mut nodes,
            &mut index,
            Node {
                id: id.clone(),
                kind,
                raw_dependencies: directive.depends_units.clone(),
                dependencies: Vec::new(),
                origin: NodeOrigin::Directive(i),
                output_path,
            },
        )?;
        aliases.entry(directive.unit_name.clone()).or_insert_with(|| id.clone());
        aliases.entry(segment.to_string()).or_insert_with(|| id.clone());
        if directive.is_shared {
            aliases.entry(format!("{segment}.so")).or_insert_with(|| id.clone());
        }
        if let Some(out) = &directive.output_path {
            aliases.entry(out.clone()).or_insert_with(|| id.clone());
        }
    }

    for (i, tool) in config.tools.iter().enumerate() {
        if tool.sources.is_empty() {
            println!("{} tool '{}' has no sources, skipping", "!".yellow(), tool.name);
            continue;
        }
        let id = tool_id(&tool.name);
        add_node(
            &mut nodes,
            &mut index,
            Node {
                id: id.clone(),
                kind: NodeKind::Executable,
                raw_dependencies: tool.libraries.clone(),
                dependencies: Vec::new(),
                origin: NodeOrigin::ConfiguredTool(i),
                output_path: tool.output_dir.join(&tool.name),
            },
        )?;
        aliases.entry(tool.name.clone()).or_insert_with(|| id.clone());
        aliases
            .entry(format!("tools/{}", tool.name))
            .or_insert_with(|| id.clone());
    }

    // Resolve raw tokens against the alias table.
    let mut unresolved: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in &mut nodes {
        let mut resolved: Vec<String> = Vec::new();
        for token in &node.raw_dependencies {
            match resolve_alias(&aliases, token) {
                Some(dep_id) => {
                    // Self-edges and duplicates are dropped.
                    if dep_id != node.id && !resolved.contains(&dep_id) {
                        resolved.push(dep_id);
                    }
                }
                None => {
                    unresolved
                        .entry(node.id.clone())
                        .or_default()
                        .push(token.clone());
                }
            }
        }
        node.dependencies = resolved;
    }

    let order = topological_order(&nodes, &index)?;

    Ok(Graph {
        nodes,
        index,
        order,
        unresolved,
    })
}

/// Plan without executing; the serializable projection for `cf plan`.
pub fn preview(config: &BuildConfig) -> Result<GraphSummary, BuildError> {
    Ok(plan(config)?.summary())
}

fn directive_output(config: &BuildConfig, directive: &BuildDirective) -> PathBuf {
    if directive.is_shared {
        let base = last_segment(&directive.unit_name);
        config
            .lib_output_dir()
            .join(format!("{base}.{}", shared_extension()))
    } else {
        let out = directive
            .output_path
            .clone()
            .unwrap_or_else(|| directive.unit_name.clone());
        config.bin_dir.join(out)
    }
}

fn add_node(
    nodes: &mut Vec<Node>,
    index: &mut HashMap<String, usize>,
    node: Node,
) -> Result<(), BuildError> {
    if index.contains_key(&node.id) {
        return Err(BuildError::DuplicateNode(node.id));
    }
    index.insert(node.id.clone(), nodes.len());
    nodes.push(node);
    Ok(())
}

/// Try the candidate spellings for `token` in order and return the first
/// alias hit.
fn resolve_alias(aliases: &HashMap<String, String>, token: &str) -> Option<String> {
    let mut candidates: Vec<String> = vec![token.to_string()];
    let base = token.strip_suffix(".so").unwrap_or(token);
    if base != token {
        candidates.push(base.to_string());
    }
    if let Some(stripped) = base.strip_prefix("lib/") {
        candidates.push(stripped.to_string());
    }
    if let Some(stripped) = token.strip_prefix("lib/") {
        candidates.push(stripped.to_string());
    }
    if token.contains('/') {
        candidates.push(last_segment(token).to_string());
    }
    candidates
        .into_iter()
        .find_map(|c| aliases.get(&c).cloned())
}

/// Kahn's algorithm with FIFO tie-breaking; node construction order seeds
/// the queue, so the result is stable for a fixed input.
fn topological_order(
    nodes: &[Node],
    index: &HashMap<String, usize>,
) -> Result<Vec<String>, BuildError> {
    let n = nodes.len();
    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, node) in nodes.iter().enumerate() {
        for dep in &node.dependencies {
            let j = index[dep];
            indegree[i] += 1;
            dependents[j].push(i);
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        order.push(nodes[i].id.clone());
        for &dependent in &dependents[i] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        return Err(BuildError::Cycle);
    }
    Ok(order)
}
