//! Bounded reachability between candidate drivers and targets
//!
//! With `A[i][j] = 1` iff the edge `j -> i` exists, `A^k[i][j]` is nonzero
//! exactly when a walk of length `k` leads from `j` to `i`. Multiplying by
//! the target indicator `C` keeps only the target rows, so `C·A^k` answers
//! "can `j` reach target `t` in exactly `k` steps" for every target at once.
//! Only the `|targets| × |N|` products are kept: `C·A^k = (C·A^(k-1))·A`.
//! Explicit paths are rebuilt by a bounded backward search.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::debug;

use crate::algorithm::traits::NodeIndex;
use crate::data_structures::graph::{ControlGraph, ControlProblem};
use crate::data_structures::matrix::Matrix;

#[derive(Debug, Clone)]
pub struct Reachability {
    targets: Vec<NodeIndex>,
    /// `C·A^0 ..= C·A^L`
    target_powers: Vec<Matrix>,
    /// Per target slot, every node reaching it within `L` steps, ascending
    ancestors: Vec<Vec<NodeIndex>>,
}

impl Reachability {
    pub fn new(problem: &ControlProblem, max_length: usize) -> Self {
        let graph = problem.graph();
        let size = graph.node_count();

        let mut adjacency = Matrix::zeros(size, size);
        for &(source, target) in graph.edges() {
            adjacency.set(target, source, 1.0);
        }

        let mut target_powers = Vec::with_capacity(max_length + 1);
        target_powers.push(Matrix::indicator(problem.targets(), size));
        for k in 1..=max_length {
            let next = target_powers[k - 1].boolean_product(&adjacency);
            target_powers.push(next);
        }

        let ancestors: Vec<Vec<NodeIndex>> = (0..problem.targets().len())
            .map(|slot| {
                let mut reaches = vec![false; size];
                for power in &target_powers {
                    for node in power.nonzero_columns(slot) {
                        reaches[node] = true;
                    }
                }
                (0..size).filter(|&node| reaches[node]).collect()
            })
            .collect();

        debug!(
            "reachability up to length {}: {} walk entries, {} ancestor entries over {} target(s)",
            max_length,
            target_powers.iter().map(Matrix::count_nonzero).sum::<usize>(),
            ancestors.iter().map(Vec::len).sum::<usize>(),
            ancestors.len()
        );

        Self {
            targets: problem.targets().to_vec(),
            target_powers,
            ancestors,
        }
    }

    pub fn max_length(&self) -> usize {
        self.target_powers.len() - 1
    }

    pub fn target(&self, slot: usize) -> NodeIndex {
        self.targets[slot]
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Nodes able to drive the target in `slot`, the target itself included
    pub fn ancestors(&self, slot: usize) -> &[NodeIndex] {
        &self.ancestors[slot]
    }

    pub fn is_ancestor(&self, slot: usize, node: NodeIndex) -> bool {
        self.ancestors[slot].binary_search(&node).is_ok()
    }

    /// Whether a walk of exactly `length` edges leads from `driver` to the
    /// target in `slot`
    pub fn walk_exists(&self, slot: usize, driver: NodeIndex, length: usize) -> bool {
        self.target_powers
            .get(length)
            .map_or(false, |power| power.is_nonzero(slot, driver))
    }

    /// Shortest walk length from `driver` to the target in `slot`
    pub fn shortest_length(&self, slot: usize, driver: NodeIndex) -> Option<usize> {
        (0..self.target_powers.len()).find(|&length| self.walk_exists(slot, driver, length))
    }

    /// Explicit path `[target, ..., driver]` along a shortest walk
    ///
    /// Breadth-first over predecessor lists in edge insertion order; the
    /// first discovery of a node fixes its successor on the path. Returns
    /// `None` when `driver` cannot reach the target within the length bound.
    pub fn reconstruct(
        &self,
        graph: &ControlGraph,
        slot: usize,
        driver: NodeIndex,
    ) -> Option<Vec<NodeIndex>> {
        let length = self.shortest_length(slot, driver)?;
        let target = self.targets[slot];

        let mut successor: Vec<Option<NodeIndex>> = vec![None; graph.node_count()];
        successor[target] = Some(target);
        let mut frontier = vec![target];
        for _ in 0..length {
            if successor[driver].is_some() {
                break;
            }
            let mut next = Vec::new();
            for &node in &frontier {
                for &predecessor in graph.predecessors(node) {
                    if successor[predecessor].is_none() {
                        successor[predecessor] = Some(node);
                        next.push(predecessor);
                    }
                }
            }
            frontier = next;
        }

        let mut path = vec![driver];
        let mut current = driver;
        while current != target {
            current = successor[current]?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}
