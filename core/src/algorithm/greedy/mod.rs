//! Randomized greedy control-path search
//!
//! Every iteration grows one control path per target backward from the
//! target, one edge per depth. At each depth the distinct path ends form the
//! right side of a bipartite graph and every node may serve as a predecessor
//! on the left. The heuristic rounds run successive random maximum matchings
//! over shrinking pools, and each matched predecessor is appended to every
//! path ending at its partner. After growth, paths are cut back onto shared
//! drivers and the result is offered to the archive.
//!
//! # Repeats
//! With `repeats > 1` the growth is redone inside one iteration, keeping the
//! paths whose driver already controls more than one target and regrowing
//! the others from their target.

pub mod heuristics;
pub mod parameters;
pub mod paths;

use std::collections::{HashMap, HashSet};

use log::trace;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algorithm::graph::matching::maximum_matching;
use crate::algorithm::traits::{AlgorithmKind, ControlSolver, NodeIndex, StopReason};
use crate::data_structures::control_path::{IndexedPaths, SolutionArchive};
use crate::data_structures::graph::ControlProblem;
use crate::execution::cancellation::CancellationToken;
use crate::execution::tracker::RunTracker;

use self::heuristics::{select_edges, HeuristicContext, HeuristicPlan};
use self::parameters::GreedyParameters;
use self::paths::{cut_to_driven, shared_driver_slots};

pub use self::heuristics::{Heuristic, HeuristicSet};

#[derive(Debug, Clone)]
pub struct GreedySolver {
    parameters: GreedyParameters,
    plan: HeuristicPlan,
    rng: ChaCha8Rng,
}

/// Facts about known control paths the heuristics may consult
struct Knowledge {
    controllers: Vec<bool>,
    seen: Vec<bool>,
    traversed: HashSet<(NodeIndex, NodeIndex)>,
    on_path: HashMap<NodeIndex, HashSet<NodeIndex>>,
}

impl Knowledge {
    fn gather(
        node_count: usize,
        paths: &[Vec<NodeIndex>],
        kept: &[bool],
        best: Option<&IndexedPaths>,
    ) -> Self {
        let mut knowledge = Self {
            controllers: vec![false; node_count],
            seen: vec![false; node_count],
            traversed: HashSet::new(),
            on_path: HashMap::new(),
        };

        let archived = best.map(|paths| paths.as_slice()).unwrap_or(&[]);
        for path in paths.iter().chain(archived) {
            knowledge.note_path(path);
        }
        let settled = paths
            .iter()
            .zip(kept)
            .filter(|(_, &kept)| kept)
            .map(|(path, _)| path)
            .chain(archived);
        for path in settled {
            if let Some(&driver) = path.last() {
                knowledge.controllers[driver] = true;
            }
        }
        for (path, _) in paths.iter().zip(kept).filter(|(_, &kept)| !kept) {
            if let Some(&end) = path.last() {
                knowledge.on_path.entry(end).or_default().extend(path.iter().copied());
            }
        }
        knowledge
    }

    fn note_path(&mut self, path: &[NodeIndex]) {
        for &node in path {
            self.seen[node] = true;
        }
        for step in path.windows(2) {
            self.traversed.insert((step[1], step[0]));
        }
    }

    fn context<'a>(&'a self, preferred: &'a [bool]) -> HeuristicContext<'a> {
        HeuristicContext {
            preferred,
            controllers: &self.controllers,
            seen: &self.seen,
            traversed: &self.traversed,
            on_path: &self.on_path,
        }
    }
}

impl GreedySolver {
    pub fn new(parameters: GreedyParameters) -> Self {
        Self {
            plan: parameters.plan(),
            rng: ChaCha8Rng::seed_from_u64(parameters.random_seed),
            parameters,
        }
    }

    pub fn plan(&self) -> &HeuristicPlan {
        &self.plan
    }

    /// Builds one candidate solution; `None` if cancelled midway
    fn iterate(
        &mut self,
        problem: &ControlProblem,
        best: Option<&IndexedPaths>,
        token: &CancellationToken,
    ) -> Option<IndexedPaths> {
        let mut paths: IndexedPaths = problem.targets().iter().map(|&target| vec![target]).collect();
        let mut kept = vec![false; paths.len()];

        for repeat in 0..self.parameters.repeats {
            for (path, _) in paths.iter_mut().zip(&kept).filter(|(_, &kept)| !kept) {
                path.truncate(1);
            }
            self.grow(problem, &mut paths, &kept, best, token)?;
            let cuts = cut_to_driven(&mut paths);
            kept = shared_driver_slots(&paths);
            trace!(
                "greedy repeat {}: {} cut(s), {} path(s) kept",
                repeat,
                cuts,
                kept.iter().filter(|&&kept| kept).count()
            );
        }
        Some(paths)
    }

    /// Grows the non-kept paths up to the maximum path length
    fn grow(
        &mut self,
        problem: &ControlProblem,
        paths: &mut IndexedPaths,
        kept: &[bool],
        best: Option<&IndexedPaths>,
        token: &CancellationToken,
    ) -> Option<()> {
        let graph = problem.graph();
        let node_count = graph.node_count();

        for depth in 0..self.parameters.maximum_path_length {
            let mut open: Vec<NodeIndex> = Vec::new();
            let mut frontier = HashSet::new();
            for (path, _) in paths.iter().zip(kept).filter(|(_, &kept)| !kept) {
                if let Some(&end) = path.last() {
                    if frontier.insert(end) {
                        open.push(end);
                    }
                }
            }
            if open.is_empty() {
                break;
            }

            let knowledge = Knowledge::gather(node_count, paths, kept, best);
            let context = knowledge.context(problem.preferred());
            let mut available = vec![true; node_count];
            let mut partner: HashMap<NodeIndex, NodeIndex> = HashMap::new();

            for round in self.plan.rounds() {
                if token.is_cancelled() {
                    return None;
                }
                if open.is_empty() {
                    break;
                }
                let edges = select_edges(graph, &available, &open, round, &context);
                if edges.is_empty() {
                    continue;
                }
                let mut sources = Vec::new();
                let mut listed = HashSet::new();
                for &(source, _) in &edges {
                    if listed.insert(source) {
                        sources.push(source);
                    }
                }

                let pairs = maximum_matching(&sources, &open, &edges, &mut self.rng);
                trace!(
                    "greedy depth {} round {}: {} candidate edge(s), {} matched",
                    depth,
                    round,
                    edges.len(),
                    pairs.len()
                );
                for &(source, target) in &pairs {
                    available[source] = false;
                    partner.insert(target, source);
                }
                open.retain(|node| !partner.contains_key(node));
            }

            if partner.is_empty() {
                break;
            }
            for (path, _) in paths.iter_mut().zip(kept).filter(|(_, &kept)| !kept) {
                let extension = path.last().and_then(|end| partner.get(end)).copied();
                if let Some(predecessor) = extension {
                    path.push(predecessor);
                }
            }
        }
        Some(())
    }
}

impl ControlSolver for GreedySolver {
    type Parameters = GreedyParameters;

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Greedy
    }

    fn parameters(&self) -> &GreedyParameters {
        &self.parameters
    }

    fn summary(&self, problem: &ControlProblem) -> String {
        format!(
            "Greedy search for {} target(s) over {} node(s) and {} edge(s), maximum path length {}, {} repeat(s), heuristics {}.",
            problem.targets().len(),
            problem.graph().node_count(),
            problem.graph().edge_count(),
            self.parameters.maximum_path_length,
            self.parameters.repeats,
            self.plan
        )
    }

    fn search(
        &mut self,
        problem: &ControlProblem,
        tracker: &mut RunTracker<'_>,
        archive: &mut SolutionArchive,
    ) -> StopReason {
        loop {
            if let Some(reason) = tracker.check_stop() {
                return reason;
            }
            let token = tracker.token().clone();
            let paths = match self.iterate(problem, archive.best(), &token) {
                Some(paths) => paths,
                None => return StopReason::Cancelled,
            };
            tracker.begin_iteration();
            let update = archive.offer(&paths);
            tracker.record(update, archive);
            tracker.publish(archive);
        }
    }
}
