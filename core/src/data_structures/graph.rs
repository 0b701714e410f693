//! Network snapshot with dense node indexing
//!
//! Node identifiers arrive as opaque strings. A [`ControlGraph`] interns them
//! once per run, deduplicates edges and builds predecessor and successor
//! lists, so the solvers never touch strings or rescan the edge list in
//! their hot loops.
//!
//! # Invariants
//! - Every edge endpoint is a node of the graph
//! - Each ordered pair appears at most once; self-loops are kept
//! - Indices are assigned in first-appearance order, so identical inputs
//!   always produce identical indices
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AnalysisError, NodeIndex};

/// Directed edge between two node identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Caller-supplied network, targets and preferred nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeSpec>,
    pub targets: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl NetworkSnapshot {
    /// Builds a snapshot whose node set is inferred from the edge endpoints
    pub fn from_edges<I, S>(edges: I, targets: &[&str], sources: &[&str]) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut specs = Vec::new();
        for (source, target) in edges {
            let spec = EdgeSpec::new(source, target);
            for id in [&spec.source, &spec.target] {
                if seen.insert(id.clone()) {
                    nodes.push(id.clone());
                }
            }
            specs.push(spec);
        }
        for id in targets.iter().chain(sources) {
            if seen.insert(id.to_string()) {
                nodes.push(id.to_string());
            }
        }
        Self {
            nodes,
            edges: specs,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Directed graph over dense indices
#[derive(Debug, Clone)]
pub struct ControlGraph {
    ids: Vec<String>,
    lookup: HashMap<String, NodeIndex>,
    edges: Vec<(NodeIndex, NodeIndex)>,
    edge_lookup: HashSet<(NodeIndex, NodeIndex)>,
    predecessors: Vec<Vec<NodeIndex>>,
    successors: Vec<Vec<NodeIndex>>,
}

impl ControlGraph {
    /// Interns the node set and validates every edge against it
    pub fn new(nodes: &[String], edges: &[EdgeSpec]) -> Result<Self, AnalysisError> {
        let mut ids = Vec::with_capacity(nodes.len());
        let mut lookup = HashMap::with_capacity(nodes.len());
        for id in nodes {
            if !lookup.contains_key(id) {
                lookup.insert(id.clone(), ids.len());
                ids.push(id.clone());
            }
        }

        let mut graph = Self {
            predecessors: vec![Vec::new(); ids.len()],
            successors: vec![Vec::new(); ids.len()],
            ids,
            lookup,
            edges: Vec::with_capacity(edges.len()),
            edge_lookup: HashSet::with_capacity(edges.len()),
        };

        for edge in edges {
            let source = graph.require_edge_endpoint(edge, &edge.source)?;
            let target = graph.require_edge_endpoint(edge, &edge.target)?;
            graph.insert_edge(source, target);
        }

        Ok(graph)
    }

    fn require_edge_endpoint(&self, edge: &EdgeSpec, id: &str) -> Result<NodeIndex, AnalysisError> {
        self.index_of(id).ok_or_else(|| AnalysisError::UnknownEdgeNode {
            from: edge.source.clone(),
            to: edge.target.clone(),
            missing: id.to_string(),
        })
    }

    fn insert_edge(&mut self, source: NodeIndex, target: NodeIndex) {
        if self.edge_lookup.insert((source, target)) {
            self.edges.push((source, target));
            self.successors[source].push(target);
            self.predecessors[target].push(source);
        }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.lookup.get(id).copied()
    }

    #[inline]
    pub fn id(&self, node: NodeIndex) -> &str {
        &self.ids[node]
    }

    /// Deduplicated edges as `(source, target)` in insertion order
    pub fn edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.edges
    }

    #[inline]
    pub fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.edge_lookup.contains(&(source, target))
    }

    /// Nodes with an edge into `node`
    #[inline]
    pub fn predecessors(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.predecessors[node]
    }

    /// Nodes reached by an edge out of `node`
    #[inline]
    pub fn successors(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.successors[node]
    }
}

/// Validated solver input: the graph plus resolved targets and preferred nodes
#[derive(Debug, Clone)]
pub struct ControlProblem {
    graph: ControlGraph,
    targets: Vec<NodeIndex>,
    sources: Vec<NodeIndex>,
    preferred: Vec<bool>,
}

impl ControlProblem {
    /// Resolves a snapshot, failing on the first consistency violation
    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<Self, AnalysisError> {
        let graph = ControlGraph::new(&snapshot.nodes, &snapshot.edges)?;

        let targets = resolve(&graph, &snapshot.targets, AnalysisError::UnknownTarget)?;
        if targets.is_empty() {
            return Err(AnalysisError::EmptyTargets);
        }
        let sources = resolve(&graph, &snapshot.sources, AnalysisError::UnknownSource)?;

        let mut preferred = vec![false; graph.node_count()];
        for &source in &sources {
            preferred[source] = true;
        }

        Ok(Self {
            graph,
            targets,
            sources,
            preferred,
        })
    }

    pub fn graph(&self) -> &ControlGraph {
        &self.graph
    }

    /// Targets in first-appearance order; the position is the target's slot
    pub fn targets(&self) -> &[NodeIndex] {
        &self.targets
    }

    pub fn sources(&self) -> &[NodeIndex] {
        &self.sources
    }

    /// Membership mask of preferred nodes, indexed by node
    pub fn preferred(&self) -> &[bool] {
        &self.preferred
    }

    #[inline]
    pub fn is_preferred(&self, node: NodeIndex) -> bool {
        self.preferred[node]
    }
}

fn resolve(
    graph: &ControlGraph,
    ids: &[String],
    unknown: fn(String) -> AnalysisError,
) -> Result<Vec<NodeIndex>, AnalysisError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let node = graph.index_of(id).ok_or_else(|| unknown(id.clone()))?;
        if seen.insert(node) {
            resolved.push(node);
        }
    }
    Ok(resolved)
}
