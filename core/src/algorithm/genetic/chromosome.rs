//! Chromosomes: one driver gene per target slot
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use crate::algorithm::traits::NodeIndex;
use crate::data_structures::control_path::IndexedPaths;
use crate::data_structures::graph::ControlGraph;

use super::reachability::Reachability;

/// Driver choice for every target, in target slot order
///
/// A gene equal to its own target means the target drives itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome {
    genes: Vec<NodeIndex>,
}

impl Chromosome {
    pub fn new(genes: Vec<NodeIndex>) -> Self {
        Self { genes }
    }

    pub fn genes(&self) -> &[NodeIndex] {
        &self.genes
    }

    pub fn gene(&self, slot: usize) -> NodeIndex {
        self.genes[slot]
    }

    /// Number of targets each driver controls
    pub fn loads(&self) -> HashMap<NodeIndex, usize> {
        let mut loads = HashMap::new();
        for &driver in &self.genes {
            *loads.entry(driver).or_insert(0) += 1;
        }
        loads
    }

    pub fn driver_count(&self) -> usize {
        self.loads().len()
    }

    /// `((T - D) + (P + W) / (D + 1)) / T` for `T` targets, `D` distinct
    /// drivers, `P` preferred drivers and reach share `W`
    ///
    /// `W` sums the shortest walk length of every gene to its target over
    /// `T·L + 1`, so it stays below one. With `P <= D` the tie-break term
    /// stays below one and the score is strictly decreasing in `D`. Among
    /// equal driver counts, preferred drivers come first, then drivers
    /// further upstream.
    pub fn fitness(&self, preferred: &[bool], reach: &Reachability) -> f64 {
        let loads = self.loads();
        let targets = self.genes.len().max(1) as f64;
        let drivers = loads.len() as f64;
        let preferred = loads.keys().filter(|&&driver| preferred[driver]).count() as f64;
        let share = self.reach_share(reach);
        ((targets - drivers) + (preferred + share) / (drivers + 1.0)) / targets
    }

    /// Total shortest walk length of the genes, scaled into `[0, 1)`
    fn reach_share(&self, reach: &Reachability) -> f64 {
        let walked: usize = self
            .genes
            .iter()
            .enumerate()
            .filter_map(|(slot, &driver)| reach.shortest_length(slot, driver))
            .sum();
        let ceiling = self.genes.len() * reach.max_length() + 1;
        walked as f64 / ceiling as f64
    }

    /// Whether every gene lies in its target's ancestor set
    pub fn is_within(&self, reach: &Reachability) -> bool {
        self.genes
            .iter()
            .enumerate()
            .all(|(slot, &driver)| reach.is_ancestor(slot, driver))
    }

    /// Explicit control paths, one per target
    pub fn control_paths(&self, reach: &Reachability, graph: &ControlGraph) -> IndexedPaths {
        self.genes
            .iter()
            .enumerate()
            .map(|(slot, &driver)| {
                reach
                    .reconstruct(graph, slot, driver)
                    .unwrap_or_else(|| vec![reach.target(slot)])
            })
            .collect()
    }
}
