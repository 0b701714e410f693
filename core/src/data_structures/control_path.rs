//! Control paths, solutions and the best-solution archive
//!
//! Internally a solution is one index path per target slot, each ordered
//! `[target, ..., driver]`. Only at the end of a run are paths translated
//! back to node identifiers for the caller.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::cmp::Reverse;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::NodeIndex;
use crate::data_structures::graph::ControlGraph;

/// One index path per target slot, `[target, ..., driver]`
pub type IndexedPaths = Vec<Vec<NodeIndex>>;

/// Distinct final nodes across all paths, in slot order
pub fn driver_nodes(paths: &[Vec<NodeIndex>]) -> Vec<NodeIndex> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter_map(|path| path.last().copied())
        .filter(|driver| seen.insert(*driver))
        .collect()
}

/// Cardinality of the driver set, the objective to minimize
pub fn driver_count(paths: &[Vec<NodeIndex>]) -> usize {
    paths
        .iter()
        .filter_map(|path| path.last())
        .collect::<HashSet<_>>()
        .len()
}

/// Control path of a single target, expressed in node identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlPath {
    pub target: String,
    pub driver: String,
    /// `[target, ..., driver]`
    pub nodes: Vec<String>,
    /// Graph edges `(source, target)` walked from the driver to the target
    pub edges: Vec<(String, String)>,
}

impl ControlPath {
    fn from_indices(graph: &ControlGraph, path: &[NodeIndex]) -> Self {
        let nodes: Vec<String> = path.iter().map(|&node| graph.id(node).to_string()).collect();
        let edges = path
            .windows(2)
            .rev()
            .map(|step| (graph.id(step[1]).to_string(), graph.id(step[0]).to_string()))
            .collect();
        Self {
            target: nodes.first().cloned().unwrap_or_default(),
            driver: nodes.last().cloned().unwrap_or_default(),
            nodes,
            edges,
        }
    }

    /// Number of edges in the path
    pub fn length(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// A full solution: exactly one control path per target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPathSet {
    pub paths: Vec<ControlPath>,
}

impl ControlPathSet {
    pub fn from_indices(graph: &ControlGraph, paths: &[Vec<NodeIndex>]) -> Self {
        Self {
            paths: paths
                .iter()
                .map(|path| ControlPath::from_indices(graph, path))
                .collect(),
        }
    }

    /// Distinct drivers in target order
    pub fn driver_nodes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.paths
            .iter()
            .map(|path| path.driver.as_str())
            .filter(|driver| seen.insert(*driver))
            .collect()
    }

    pub fn driver_count(&self) -> usize {
        self.driver_nodes().len()
    }

    /// Targets steered by the given driver
    pub fn controlled_targets(&self, driver: &str) -> Vec<&str> {
        self.paths
            .iter()
            .filter(|path| path.driver == driver)
            .map(|path| path.target.as_str())
            .collect()
    }

    /// Targets grouped by driver
    pub fn by_driver(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for path in &self.paths {
            groups.entry(path.driver.as_str()).or_default().push(path.target.as_str());
        }
        groups
    }

    pub fn path_for(&self, target: &str) -> Option<&ControlPath> {
        self.paths.iter().find(|path| path.target == target)
    }

    pub fn max_length(&self) -> usize {
        self.paths.iter().map(ControlPath::length).max().unwrap_or(0)
    }
}

/// Outcome of offering a candidate solution to the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveUpdate {
    /// Strictly fewer drivers than anything seen; archive replaced
    Improved,
    /// Same driver count, new path set; retained alongside the others
    Equivalent,
    /// Same driver count, identical to a retained path set
    Duplicate,
    /// More drivers than the archived best
    Worse,
}

impl ArchiveUpdate {
    pub fn is_improvement(self) -> bool {
        self == ArchiveUpdate::Improved
    }

    /// The more significant of two updates from the same iteration
    pub fn merge(self, other: ArchiveUpdate) -> ArchiveUpdate {
        fn rank(update: ArchiveUpdate) -> u8 {
            match update {
                ArchiveUpdate::Improved => 3,
                ArchiveUpdate::Equivalent => 2,
                ArchiveUpdate::Duplicate => 1,
                ArchiveUpdate::Worse => 0,
            }
        }
        if rank(other) > rank(self) {
            other
        } else {
            self
        }
    }
}

/// Total number of edges over all paths of a solution
pub fn total_length(paths: &[Vec<NodeIndex>]) -> usize {
    paths.iter().map(|path| path.len().saturating_sub(1)).sum()
}

fn fingerprint(paths: &[Vec<NodeIndex>]) -> u64 {
    let mut hasher = DefaultHasher::new();
    paths.hash(&mut hasher);
    hasher.finish()
}

/// Best solutions found so far, all sharing the minimum driver count
///
/// Each solution is stored once; duplicates are found through a fingerprint
/// index and confirmed by comparing paths. Among equal driver counts, the
/// solution with the most path edges, earliest on ties, is the best one.
#[derive(Debug, Clone, Default)]
pub struct SolutionArchive {
    best_count: Option<usize>,
    solutions: Vec<IndexedPaths>,
    lengths: Vec<usize>,
    lookup: HashMap<u64, Vec<usize>>,
    best: Option<usize>,
}

impl SolutionArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, paths: &[Vec<NodeIndex>]) -> ArchiveUpdate {
        let count = driver_count(paths);
        let fingerprint = fingerprint(paths);
        match self.best_count {
            Some(best) if count > best => ArchiveUpdate::Worse,
            Some(best) if count == best => {
                if self.contains(fingerprint, paths) {
                    ArchiveUpdate::Duplicate
                } else {
                    self.insert(fingerprint, paths);
                    ArchiveUpdate::Equivalent
                }
            }
            _ => {
                self.best_count = Some(count);
                self.solutions.clear();
                self.lengths.clear();
                self.lookup.clear();
                self.best = None;
                self.insert(fingerprint, paths);
                ArchiveUpdate::Improved
            }
        }
    }

    fn contains(&self, fingerprint: u64, paths: &[Vec<NodeIndex>]) -> bool {
        self.lookup.get(&fingerprint).map_or(false, |positions| {
            positions
                .iter()
                .any(|&position| self.solutions[position] == paths)
        })
    }

    fn insert(&mut self, fingerprint: u64, paths: &[Vec<NodeIndex>]) {
        let position = self.solutions.len();
        let length = total_length(paths);
        self.solutions.push(paths.to_vec());
        self.lengths.push(length);
        self.lookup.entry(fingerprint).or_default().push(position);
        if self.best.map_or(true, |best| length > self.lengths[best]) {
            self.best = Some(position);
        }
    }

    pub fn best_count(&self) -> Option<usize> {
        self.best_count
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Archived solution whose drivers sit furthest upstream
    pub fn best(&self) -> Option<&IndexedPaths> {
        self.best.map(|position| &self.solutions[position])
    }

    /// Archived solutions in insertion order
    pub fn solutions(&self) -> &[IndexedPaths] {
        &self.solutions
    }

    /// Positions ordered by total path length, longest first, stable
    fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.solutions.len()).collect();
        order.sort_by_key(|&position| Reverse(self.lengths[position]));
        order
    }

    /// Solutions as identifier paths, best first
    pub fn to_path_sets(&self, graph: &ControlGraph) -> Vec<ControlPathSet> {
        self.ranked()
            .into_iter()
            .map(|position| ControlPathSet::from_indices(graph, &self.solutions[position]))
            .collect()
    }
}
