//! Run lifecycle shared by every solver
//!
//! `execute` validates parameters and the network snapshot, drives the
//! status transitions and hands the solver a tracker and an archive. Input
//! errors end the run in `Error` before the first iteration.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::debug;

use crate::algorithm::traits::{
    AlgorithmKind, AnalysisError, AnalysisOutcome, ControlSolver, SolverParameters,
};
use crate::data_structures::control_path::SolutionArchive;
use crate::data_structures::graph::{ControlProblem, NetworkSnapshot};
use crate::execution::cancellation::CancellationToken;
use crate::execution::monitor::{RunSettings, StatusSink};
use crate::execution::tracker::{IterationLimits, RunTracker};

pub fn execute<S: ControlSolver>(
    solver: &mut S,
    snapshot: &NetworkSnapshot,
    settings: RunSettings,
    sink: &mut dyn StatusSink,
    token: &CancellationToken,
) -> Result<AnalysisOutcome, AnalysisError> {
    let kind = solver.kind();
    let limits = solver.parameters().limits();
    let mut tracker = RunTracker::new(kind, sink, token, settings, limits);
    tracker.initialize();

    let problem = match solver
        .parameters()
        .validate()
        .and_then(|_| ControlProblem::from_snapshot(snapshot))
    {
        Ok(problem) => problem,
        Err(error) => {
            tracker.fail(&error);
            return Err(error);
        }
    };
    debug!(
        "{} run over {} node(s), {} edge(s), {} target(s), seed {}",
        kind,
        problem.graph().node_count(),
        problem.graph().edge_count(),
        problem.targets().len(),
        solver.parameters().random_seed()
    );

    let mut archive = SolutionArchive::new();
    let summary = solver.summary(&problem);
    tracker.start(&summary);
    tracker.publish(&archive);

    let stop_reason = solver.search(&problem, &mut tracker, &mut archive);

    let iterations = tracker.iteration();
    let iterations_without_improvement = tracker.without_improvement();
    let status = tracker.finish(stop_reason, &archive);

    Ok(AnalysisOutcome {
        algorithm: kind,
        status,
        stop_reason,
        iterations,
        iterations_without_improvement,
        solutions: archive.to_path_sets(problem.graph()),
    })
}

/// Reports an error detected before a solver could be built
pub fn reject(
    algorithm: AlgorithmKind,
    error: &AnalysisError,
    settings: RunSettings,
    sink: &mut dyn StatusSink,
    token: &CancellationToken,
) {
    let limits = IterationLimits {
        maximum_iterations: 0,
        maximum_iterations_without_improvement: 0,
    };
    let mut tracker = RunTracker::new(algorithm, sink, token, settings, limits);
    tracker.initialize();
    tracker.fail(error);
}
