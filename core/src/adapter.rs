//! Request and report types for callers that hold the run record
//!
//! An [`AnalysisRequest`] bundles the algorithm choice, the network snapshot
//! and a free-form parameter payload. Running it always yields an
//! [`AnalysisReport`], erroneous runs included, so the caller can persist the
//! final state of the record without inspecting error types.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};

use crate::algorithm::genetic::parameters::GeneticParameters;
use crate::algorithm::genetic::GeneticSolver;
use crate::algorithm::greedy::parameters::GreedyParameters;
use crate::algorithm::greedy::GreedySolver;
use crate::algorithm::traits::{
    AlgorithmKind, AnalysisError, AnalysisOutcome, RunStatus, SolverParameters, StopReason,
};
use crate::data_structures::control_path::ControlPath;
use crate::data_structures::graph::NetworkSnapshot;
use crate::execution::cancellation::CancellationToken;
use crate::execution::monitor::{Progress, RunControl, RunSettings, StatusSink};
use crate::execution::runner::{execute, reject};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub algorithm: AlgorithmKind,
    pub network: NetworkSnapshot,
    /// Parameter object of the chosen algorithm; `null` means all defaults
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl AnalysisRequest {
    pub fn from_json(text: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(text)?)
    }

    fn typed_parameters<P: SolverParameters>(&self) -> Result<P, AnalysisError> {
        if self.parameters.is_null() {
            return Ok(P::default());
        }
        serde_json::from_value(self.parameters.clone())
            .map_err(|error| AnalysisError::MalformedParameters(error.to_string()))
    }

    pub fn greedy_parameters(&self) -> Result<GreedyParameters, AnalysisError> {
        self.typed_parameters()
    }

    pub fn genetic_parameters(&self) -> Result<GeneticParameters, AnalysisError> {
        self.typed_parameters()
    }

    /// Applies `name = value` overrides to the parameter payload
    pub fn apply_overrides(&mut self, overrides: &[(String, String)]) -> Result<(), AnalysisError> {
        self.parameters = match self.algorithm {
            AlgorithmKind::Greedy => Self::overridden(self.greedy_parameters()?, overrides)?,
            AlgorithmKind::Genetic => Self::overridden(self.genetic_parameters()?, overrides)?,
        };
        Ok(())
    }

    fn overridden<P: SolverParameters>(
        mut parameters: P,
        overrides: &[(String, String)],
    ) -> Result<serde_json::Value, AnalysisError> {
        for (name, value) in overrides {
            parameters.set_parameter(name, value)?;
        }
        serde_json::to_value(&parameters).map_err(AnalysisError::from)
    }

    /// Runs the analysis to a terminal state
    pub fn run(
        &self,
        settings: RunSettings,
        sink: &mut dyn StatusSink,
        token: &CancellationToken,
    ) -> AnalysisReport {
        let mut recorder = RecordingSink::new(sink);
        let result = match self.algorithm {
            AlgorithmKind::Greedy => self.greedy_parameters().and_then(|parameters| {
                execute(
                    &mut GreedySolver::new(parameters),
                    &self.network,
                    settings,
                    &mut recorder,
                    token,
                )
            }),
            AlgorithmKind::Genetic => self.genetic_parameters().and_then(|parameters| {
                execute(
                    &mut GeneticSolver::new(parameters),
                    &self.network,
                    settings,
                    &mut recorder,
                    token,
                )
            }),
        };

        if let Err(error) = &result {
            if recorder.status.is_none() {
                reject(self.algorithm, error, settings, &mut recorder, token);
            }
        }

        let log = recorder.lines;
        match result {
            Ok(outcome) => AnalysisReport::from_outcome(self.name.clone(), outcome, log),
            Err(error) => AnalysisReport {
                name: self.name.clone(),
                algorithm: self.algorithm,
                status: RunStatus::Error,
                stop_reason: None,
                error: Some(error.to_string()),
                iterations: 0,
                iterations_without_improvement: 0,
                driver_count: None,
                solutions: Vec::new(),
                log,
            },
        }
    }
}

/// Forwards everything to the caller's sink and keeps a copy of the log
struct RecordingSink<'a> {
    inner: &'a mut dyn StatusSink,
    status: Option<RunStatus>,
    lines: Vec<String>,
}

impl<'a> RecordingSink<'a> {
    fn new(inner: &'a mut dyn StatusSink) -> Self {
        Self {
            inner,
            status: None,
            lines: Vec::new(),
        }
    }
}

impl StatusSink for RecordingSink<'_> {
    fn set_status(&mut self, status: RunStatus) {
        self.status = Some(status);
        self.inner.set_status(status);
    }

    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
        self.inner.log(line);
    }

    fn report_progress(&mut self, progress: &Progress) {
        self.inner.report_progress(progress);
    }

    fn poll(&mut self) -> RunControl {
        self.inner.poll()
    }
}

/// Drivers and paths of one solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionReport {
    pub drivers: Vec<String>,
    pub paths: Vec<ControlPath>,
}

/// Final state of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub name: Option<String>,
    pub algorithm: AlgorithmKind,
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    pub error: Option<String>,
    pub iterations: usize,
    pub iterations_without_improvement: usize,
    pub driver_count: Option<usize>,
    pub solutions: Vec<SolutionReport>,
    pub log: Vec<String>,
}

impl AnalysisReport {
    fn from_outcome(name: Option<String>, outcome: AnalysisOutcome, log: Vec<String>) -> Self {
        let driver_count = outcome.driver_count();
        let solutions = outcome
            .solutions
            .into_iter()
            .map(|solution| SolutionReport {
                drivers: solution.driver_nodes().into_iter().map(str::to_string).collect(),
                paths: solution.paths,
            })
            .collect();
        Self {
            name,
            algorithm: outcome.algorithm,
            status: outcome.status,
            stop_reason: Some(outcome.stop_reason),
            error: None,
            iterations: outcome.iterations,
            iterations_without_improvement: outcome.iterations_without_improvement,
            driver_count,
            solutions,
            log,
        }
    }
}
