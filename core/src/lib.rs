//! drivernet core
//! Structural target controllability: minimum driver sets for directed networks
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>
//!
//! Given a directed network, a set of target nodes and optionally a set of
//! preferred source nodes, the solvers search for a small set of driver
//! nodes and one control path per target leading back from the target to a
//! driver. Two strategies are provided:
//!
//! - [`run_greedy`]: repeated randomized maximum matchings with heuristic
//!   edge filters, growing control paths backward one edge at a time
//! - [`run_genetic`]: a genetic search over bounded reachability matrices
//!
//! Both report through a [`StatusSink`], honor a [`CancellationToken`] and
//! are reproducible for a fixed `randomSeed`.

pub mod adapter;
pub mod algorithm;
pub mod data_structures;
pub mod execution;

pub use adapter::{AnalysisReport, AnalysisRequest, SolutionReport};
pub use algorithm::genetic::parameters::GeneticParameters;
pub use algorithm::greedy::heuristics::HeuristicPlan;
pub use algorithm::greedy::parameters::GreedyParameters;
pub use algorithm::traits::{
    AlgorithmKind, AnalysisError, AnalysisOutcome, NodeIndex, RunStatus, SolverParameters,
    StopReason,
};
pub use algorithm::{CrossoverType, GeneticSolver, GreedySolver, Heuristic, MutationType};
pub use data_structures::{ControlPath, ControlPathSet, EdgeSpec, NetworkSnapshot};
pub use execution::{
    CancellationToken, LogSink, MemorySink, Progress, RunControl, RunSettings, StatusSink,
};

/// Greedy search for a minimum driver set
///
/// Input errors are reported to `sink` with the `Error` status and returned.
pub fn run_greedy(
    network: &NetworkSnapshot,
    parameters: &GreedyParameters,
    settings: RunSettings,
    sink: &mut dyn StatusSink,
    token: &CancellationToken,
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut solver = GreedySolver::new(parameters.clone());
    execution::execute(&mut solver, network, settings, sink, token)
}

/// Genetic search for a minimum driver set
///
/// Input errors are reported to `sink` with the `Error` status and returned.
pub fn run_genetic(
    network: &NetworkSnapshot,
    parameters: &GeneticParameters,
    settings: RunSettings,
    sink: &mut dyn StatusSink,
    token: &CancellationToken,
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut solver = GeneticSolver::new(parameters.clone());
    execution::execute(&mut solver, network, settings, sink, token)
}
