//! Heuristic edge selection for the greedy matching rounds
//!
//! Each matching round of the greedy search runs on a subset of the edges
//! entering the current frontier. The subset is chosen by a *heuristic set*:
//! a union of letters, each admitting the edges that satisfy one rule.
//! Rounds are applied in the order given by a [`HeuristicPlan`], and the
//! catch-all letter `Z` always closes the plan.
//!
//! | Letter | Admits `u -> v` when |
//! |---|---|
//! | `A` | `u` is preferred and the edge is already traversed |
//! | `B` | `u` is preferred |
//! | `C` | `u` is a known driver and the edge is already traversed |
//! | `D` | `u` is a known driver |
//! | `E` | `u` lies on a known control path |
//! | `F` | `u` is not on any path currently ending at `v` |
//! | `Z` | always |
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AnalysisError, NodeIndex};
use crate::data_structures::graph::ControlGraph;

/// A single edge-admission rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Heuristic {
    A,
    B,
    C,
    D,
    E,
    F,
    Z,
}

impl Heuristic {
    pub const ALL: [Heuristic; 7] = [
        Heuristic::A,
        Heuristic::B,
        Heuristic::C,
        Heuristic::D,
        Heuristic::E,
        Heuristic::F,
        Heuristic::Z,
    ];

    pub fn letter(self) -> &'static str {
        match self {
            Heuristic::A => "A",
            Heuristic::B => "B",
            Heuristic::C => "C",
            Heuristic::D => "D",
            Heuristic::E => "E",
            Heuristic::F => "F",
            Heuristic::Z => "Z",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Heuristic::A => "edges from preferred nodes already traversed by a known control path",
            Heuristic::B => "edges from preferred nodes",
            Heuristic::C => "edges from known driver nodes already traversed by a known control path",
            Heuristic::D => "edges from known driver nodes",
            Heuristic::E => "edges from nodes appearing anywhere in a known control path",
            Heuristic::F => "edges from nodes not yet on the control path being extended",
            Heuristic::Z => "any edge",
        }
    }

    /// Whether the edge `source -> target` passes this rule
    pub fn admits(self, source: NodeIndex, target: NodeIndex, context: &HeuristicContext<'_>) -> bool {
        match self {
            Heuristic::A => context.preferred[source] && context.traversed.contains(&(source, target)),
            Heuristic::B => context.preferred[source],
            Heuristic::C => {
                context.controllers[source] && context.traversed.contains(&(source, target))
            }
            Heuristic::D => context.controllers[source],
            Heuristic::E => context.seen[source],
            Heuristic::F => !context
                .on_path
                .get(&target)
                .map_or(false, |nodes| nodes.contains(&source)),
            Heuristic::Z => true,
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Heuristic {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Heuristic::ALL
            .iter()
            .copied()
            .find(|heuristic| heuristic.letter().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                AnalysisError::invalid("heuristics", format!("unknown heuristic letter '{}'", value))
            })
    }
}

/// Union of letters applied as one matching round
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeuristicSet(Vec<Heuristic>);

impl HeuristicSet {
    pub fn new(letters: impl IntoIterator<Item = Heuristic>) -> Self {
        let mut letters: Vec<Heuristic> = letters.into_iter().collect();
        letters.sort_unstable();
        letters.dedup();
        Self(letters)
    }

    pub fn letters(&self) -> &[Heuristic] {
        &self.0
    }

    pub fn is_catch_all(&self) -> bool {
        self.0.contains(&Heuristic::Z)
    }

    pub fn admits(&self, source: NodeIndex, target: NodeIndex, context: &HeuristicContext<'_>) -> bool {
        self.0.iter().any(|heuristic| heuristic.admits(source, target, context))
    }
}

impl fmt::Display for HeuristicSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: Vec<&str> = self.0.iter().map(|h| h.letter()).collect();
        write!(f, "[{}]", letters.join(","))
    }
}

/// Ordered matching rounds, always ending with a catch-all round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicPlan {
    rounds: Vec<HeuristicSet>,
}

impl HeuristicPlan {
    /// Builds a plan from letter sets; empty sets are skipped and a `Z`
    /// round is appended unless the last round already contains `Z`
    pub fn new(sets: &[Vec<Heuristic>]) -> Self {
        let mut rounds: Vec<HeuristicSet> = sets
            .iter()
            .filter(|letters| !letters.is_empty())
            .map(|letters| HeuristicSet::new(letters.iter().copied()))
            .collect();
        if !rounds.last().map_or(false, HeuristicSet::is_catch_all) {
            rounds.push(HeuristicSet::new([Heuristic::Z]));
        }
        Self { rounds }
    }

    pub fn rounds(&self) -> &[HeuristicSet] {
        &self.rounds
    }

    /// Default letter sets: one round per letter, `A` through `Z`
    pub fn default_sets() -> Vec<Vec<Heuristic>> {
        Heuristic::ALL.iter().map(|&h| vec![h]).collect()
    }
}

impl fmt::Display for HeuristicPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounds: Vec<String> = self.rounds.iter().map(|set| set.to_string()).collect();
        write!(f, "[{}]", rounds.join(","))
    }
}

/// What the heuristics may know about the search so far
///
/// All masks are indexed by node.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicContext<'a> {
    pub preferred: &'a [bool],
    /// Final nodes of kept and archived control paths
    pub controllers: &'a [bool],
    /// Nodes on any current, kept or archived control path
    pub seen: &'a [bool],
    /// Steps `(predecessor, node)` present in current, kept or archived paths
    pub traversed: &'a HashSet<(NodeIndex, NodeIndex)>,
    /// For each frontier node, the nodes of the paths currently ending there
    pub on_path: &'a HashMap<NodeIndex, HashSet<NodeIndex>>,
}

/// Candidate edges `(source, target)` for one matching round
///
/// Only edges with `left[source]` set and `target` in `right` are returned,
/// and of those only the ones the heuristic set admits. Candidates come from
/// the predecessor lists of the right nodes, never from a scan of all edges.
pub fn select_edges(
    graph: &ControlGraph,
    left: &[bool],
    right: &[NodeIndex],
    set: &HeuristicSet,
    context: &HeuristicContext<'_>,
) -> Vec<(NodeIndex, NodeIndex)> {
    let mut selected = Vec::new();
    for &target in right {
        for &source in graph.predecessors(target) {
            if left[source] && set.admits(source, target, context) {
                selected.push((source, target));
            }
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::EdgeSpec;

    struct Fixture {
        graph: ControlGraph,
        preferred: Vec<bool>,
        controllers: Vec<bool>,
        seen: Vec<bool>,
        traversed: HashSet<(NodeIndex, NodeIndex)>,
        on_path: HashMap<NodeIndex, HashSet<NodeIndex>>,
    }

    impl Fixture {
        // 0 -> 3, 1 -> 3, 2 -> 3, 3 -> 3, 2 -> 4
        fn new() -> Self {
            let nodes: Vec<String> = (0..5).map(|i| i.to_string()).collect();
            let edges = [("0", "3"), ("1", "3"), ("2", "3"), ("3", "3"), ("2", "4")]
                .iter()
                .map(|(s, t)| EdgeSpec::new(*s, *t))
                .collect::<Vec<_>>();
            let graph = ControlGraph::new(&nodes, &edges).unwrap();

            let mut preferred = vec![false; 5];
            preferred[0] = true;
            let mut controllers = vec![false; 5];
            controllers[1] = true;
            let mut seen = vec![false; 5];
            seen[2] = true;
            seen[3] = true;
            let traversed = HashSet::from([(1, 3)]);
            let on_path = HashMap::from([(3, HashSet::from([3]))]);

            Self {
                graph,
                preferred,
                controllers,
                seen,
                traversed,
                on_path,
            }
        }

        fn context(&self) -> HeuristicContext<'_> {
            HeuristicContext {
                preferred: &self.preferred,
                controllers: &self.controllers,
                seen: &self.seen,
                traversed: &self.traversed,
                on_path: &self.on_path,
            }
        }

        fn select(&self, letters: &[Heuristic]) -> Vec<(NodeIndex, NodeIndex)> {
            let left = vec![true; 5];
            let set = HeuristicSet::new(letters.iter().copied());
            select_edges(&self.graph, &left, &[3], &set, &self.context())
        }
    }

    #[test]
    fn test_letters_admit_their_edges() {
        let fixture = Fixture::new();
        assert!(fixture.select(&[Heuristic::A]).is_empty());
        assert_eq!(fixture.select(&[Heuristic::B]), vec![(0, 3)]);
        assert_eq!(fixture.select(&[Heuristic::C]), vec![(1, 3)]);
        assert_eq!(fixture.select(&[Heuristic::D]), vec![(1, 3)]);
        assert_eq!(fixture.select(&[Heuristic::E]), vec![(2, 3), (3, 3)]);
        assert_eq!(fixture.select(&[Heuristic::F]), vec![(0, 3), (1, 3), (2, 3)]);
        assert_eq!(fixture.select(&[Heuristic::Z]).len(), 4);
    }

    #[test]
    fn test_letter_set_is_a_union() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.select(&[Heuristic::B, Heuristic::D]),
            vec![(0, 3), (1, 3)]
        );
    }

    #[test]
    fn test_left_and_right_restrictions() {
        let fixture = Fixture::new();
        let mut left = vec![true; 5];
        left[2] = false;
        let set = HeuristicSet::new([Heuristic::Z]);
        let selected = select_edges(&fixture.graph, &left, &[3, 4], &set, &fixture.context());
        assert_eq!(selected, vec![(0, 3), (1, 3), (3, 3)]);
    }

    #[test]
    fn test_plan_appends_catch_all() {
        let plan = HeuristicPlan::new(&[vec![Heuristic::A], vec![], vec![Heuristic::B]]);
        assert_eq!(plan.rounds().len(), 3);
        assert!(plan.rounds()[2].is_catch_all());
        assert_eq!(plan.to_string(), "[[A],[B],[Z]]");

        let plan = HeuristicPlan::new(&[vec![Heuristic::Z, Heuristic::A]]);
        assert_eq!(plan.rounds().len(), 1);
        assert_eq!(plan.to_string(), "[[A,Z]]");

        assert_eq!(HeuristicPlan::new(&[]).to_string(), "[[Z]]");
    }

    #[test]
    fn test_letter_parsing() {
        assert_eq!("e".parse::<Heuristic>().unwrap(), Heuristic::E);
        assert!("Q".parse::<Heuristic>().is_err());
        assert_eq!(HeuristicPlan::default_sets().len(), Heuristic::ALL.len());
    }
}
