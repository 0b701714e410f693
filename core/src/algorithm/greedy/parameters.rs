//! Greedy search parameters
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};

use crate::algorithm::greedy::heuristics::{Heuristic, HeuristicPlan};
use crate::algorithm::traits::{parse_value, time_seed, AnalysisError, SolverParameters};
use crate::execution::tracker::IterationLimits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GreedyParameters {
    pub random_seed: u64,
    pub maximum_iterations: usize,
    pub maximum_iterations_without_improvement: usize,
    /// Maximum number of edges in a control path
    pub maximum_path_length: usize,
    /// Growth passes per iteration; later passes only regrow paths whose
    /// driver controls a single target
    pub repeats: usize,
    /// Letter sets applied as successive matching rounds
    pub heuristics: Vec<Vec<Heuristic>>,
}

impl Default for GreedyParameters {
    fn default() -> Self {
        Self {
            random_seed: time_seed(),
            maximum_iterations: 100,
            maximum_iterations_without_improvement: 25,
            maximum_path_length: 5,
            repeats: 1,
            heuristics: HeuristicPlan::default_sets(),
        }
    }
}

impl GreedyParameters {
    pub fn plan(&self) -> HeuristicPlan {
        HeuristicPlan::new(&self.heuristics)
    }
}

/// Parses `A;B;C,D;Z` (rounds separated by `;`, letters by `,`) or the
/// JSON form `[["A"],["B"],["C","D"],["Z"]]`
fn parse_heuristics(value: &str) -> Result<Vec<Vec<Heuristic>>, AnalysisError> {
    let value = value.trim();
    if value.starts_with('[') {
        return serde_json::from_str(value)
            .map_err(|error| AnalysisError::invalid("heuristics", error.to_string()));
    }
    value
        .split(';')
        .filter(|round| !round.trim().is_empty())
        .map(|round| {
            round
                .split(',')
                .filter(|letter| !letter.trim().is_empty())
                .map(str::parse::<Heuristic>)
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

impl SolverParameters for GreedyParameters {
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AnalysisError> {
        match name {
            "randomSeed" => self.random_seed = parse_value(name, value)?,
            "maximumIterations" => self.maximum_iterations = parse_value(name, value)?,
            "maximumIterationsWithoutImprovement" => {
                self.maximum_iterations_without_improvement = parse_value(name, value)?
            }
            "maximumPathLength" => self.maximum_path_length = parse_value(name, value)?,
            "repeats" => self.repeats = parse_value(name, value)?,
            "heuristics" => self.heuristics = parse_heuristics(value)?,
            _ => {
                return Err(AnalysisError::invalid(
                    name,
                    "unknown parameter for the greedy algorithm",
                ))
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.maximum_iterations == 0 {
            return Err(AnalysisError::invalid("maximumIterations", "must be at least 1"));
        }
        if self.maximum_iterations_without_improvement == 0 {
            return Err(AnalysisError::invalid(
                "maximumIterationsWithoutImprovement",
                "must be at least 1",
            ));
        }
        if self.repeats == 0 {
            return Err(AnalysisError::invalid("repeats", "must be at least 1"));
        }
        Ok(())
    }

    fn random_seed(&self) -> u64 {
        self.random_seed
    }

    fn limits(&self) -> IterationLimits {
        IterationLimits {
            maximum_iterations: self.maximum_iterations,
            maximum_iterations_without_improvement: self.maximum_iterations_without_improvement,
        }
    }
}
