//! Core type definitions shared by the controllability solvers
//!
//! This module establishes the vocabulary every solver speaks: dense node
//! indices, the run status state machine, the reason a run stopped, and the
//! error taxonomy for rejected inputs.
//!
//! # Key Design Principles
//! - Node identity is interned once per run; solvers only see `NodeIndex`
//! - Input errors are fatal and reported before the first iteration
//! - A vanished run record is a clean stop, never an error
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data_structures::control_path::{ControlPathSet, SolutionArchive};
use crate::data_structures::graph::ControlProblem;
use crate::execution::tracker::{IterationLimits, RunTracker};

/// Dense node index assigned by [`ControlGraph`](crate::data_structures::graph::ControlGraph)
pub type NodeIndex = usize;

/// Solver family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// Randomized greedy search over repeated maximum matchings
    Greedy,
    /// Genetic search over reachability matrices
    Genetic,
}

impl AlgorithmKind {
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Greedy => "greedy",
            AlgorithmKind::Genetic => "genetic",
        }
    }
}

impl Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(AlgorithmKind::Greedy),
            "genetic" => Ok(AlgorithmKind::Genetic),
            other => Err(AnalysisError::InvalidParameter {
                name: "algorithm".to_string(),
                reason: format!("unknown algorithm '{}', expected 'greedy' or 'genetic'", other),
            }),
        }
    }
}

/// Run status as seen by the owner of the run record
///
/// Transitions: `Initializing -> Ongoing -> {Stopped | Completed | Error}`.
/// `Error` may also be entered straight from `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Initializing,
    Ongoing,
    Stopped,
    Completed,
    Error,
}

impl RunStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Stopped | RunStatus::Completed | RunStatus::Error)
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Initializing => "Initializing",
            RunStatus::Ongoing => "Ongoing",
            RunStatus::Stopped => "Stopped",
            RunStatus::Completed => "Completed",
            RunStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Why the iteration loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// `maximumIterations` reached
    MaximumIterations,
    /// `maximumIterationsWithoutImprovement` reached
    WithoutImprovement,
    /// Cancellation token fired
    Cancelled,
    /// The run record was switched out of the ongoing state by its owner
    StopRequested,
    /// The run record no longer exists
    RecordVanished,
}

impl StopReason {
    /// Terminal status implied by this stop reason
    pub fn status(self) -> RunStatus {
        match self {
            StopReason::MaximumIterations | StopReason::WithoutImprovement => RunStatus::Completed,
            StopReason::Cancelled | StopReason::StopRequested | StopReason::RecordVanished => {
                RunStatus::Stopped
            }
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            StopReason::MaximumIterations => "the maximum number of iterations was reached",
            StopReason::WithoutImprovement => {
                "the maximum number of iterations without improvement was reached"
            }
            StopReason::Cancelled => "the run was cancelled",
            StopReason::StopRequested => "a stop was requested",
            StopReason::RecordVanished => "the run record is no longer available",
        }
    }
}

/// Result of a finished (non-erroneous) solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub algorithm: AlgorithmKind,
    pub status: RunStatus,
    pub stop_reason: StopReason,
    pub iterations: usize,
    pub iterations_without_improvement: usize,
    /// Every distinct control-path set reaching the best driver count found
    pub solutions: Vec<ControlPathSet>,
}

impl AnalysisOutcome {
    /// Size of the best driver set, if any solution was found
    pub fn driver_count(&self) -> Option<usize> {
        self.solutions.first().map(|solution| solution.driver_count())
    }

    pub fn best(&self) -> Option<&ControlPathSet> {
        self.solutions.first()
    }
}

/// Comprehensive error types for analysis inputs
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("the edge {from} -> {to} references the node {missing}, which is not in the network")]
    UnknownEdgeNode {
        from: String,
        to: String,
        missing: String,
    },

    #[error("the target node {0} is not in the network")]
    UnknownTarget(String),

    #[error("the source node {0} is not in the network")]
    UnknownSource(String),

    #[error("at least one target node is required")]
    EmptyTargets,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("the parameters could not be read: {0}")]
    MalformedParameters(String),

    #[error("the analysis request could not be read: {0}")]
    MalformedRequest(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Named, string-settable solver parameters
///
/// Field names are the camelCase names used in serialized requests.
pub trait SolverParameters: Debug + Clone + Default + Serialize + DeserializeOwned {
    /// Sets a parameter from its textual value with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AnalysisError>;

    /// Checks value ranges; called before the problem is resolved
    fn validate(&self) -> Result<(), AnalysisError>;

    fn random_seed(&self) -> u64;

    fn limits(&self) -> IterationLimits;

    /// Current value of a parameter rendered as JSON text
    fn get_parameter(&self, name: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        value.get(name).map(|field| match field {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

/// A search strategy for minimum driver sets
///
/// Implementors own their parameters and RNG state; the surrounding run
/// (status transitions, input validation, result translation) is handled by
/// [`execute`](crate::execution::runner::execute).
pub trait ControlSolver: Debug {
    type Parameters: SolverParameters;

    fn kind(&self) -> AlgorithmKind;

    fn parameters(&self) -> &Self::Parameters;

    /// One-line description logged when the run starts
    fn summary(&self, problem: &ControlProblem) -> String;

    /// Runs iterations until the tracker reports a stop reason
    ///
    /// Every solution found is offered to `archive`.
    fn search(
        &mut self,
        problem: &ControlProblem,
        tracker: &mut RunTracker<'_>,
        archive: &mut SolutionArchive,
    ) -> StopReason;
}

/// Parses a parameter value, naming the parameter on failure
pub(crate) fn parse_value<T>(name: &str, value: &str) -> Result<T, AnalysisError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|error| AnalysisError::invalid(name, format!("'{}': {}", value, error)))
}

/// Seed used when a request does not pin one
pub(crate) fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_status_mapping() {
        assert_eq!(StopReason::MaximumIterations.status(), RunStatus::Completed);
        assert_eq!(StopReason::WithoutImprovement.status(), RunStatus::Completed);
        assert_eq!(StopReason::Cancelled.status(), RunStatus::Stopped);
        assert_eq!(StopReason::RecordVanished.status(), RunStatus::Stopped);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Initializing.is_terminal());
        assert!(!RunStatus::Ongoing.is_terminal());
        assert!(RunStatus::Stopped.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Error.is_terminal());
    }

    #[test]
    fn test_algorithm_kind_parsing() {
        assert_eq!("Greedy".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Greedy);
        assert_eq!(" genetic ".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Genetic);
        assert!("simulated-annealing".parse::<AlgorithmKind>().is_err());
    }

    #[test]
    fn test_error_messages_name_the_node() {
        let error = AnalysisError::UnknownEdgeNode {
            from: "1".to_string(),
            to: "7".to_string(),
            missing: "7".to_string(),
        };
        assert!(error.to_string().contains("1 -> 7"));
        assert!(AnalysisError::UnknownTarget("TP53".to_string())
            .to_string()
            .contains("TP53"));
    }

    #[test]
    fn test_parse_value_names_the_parameter() {
        assert_eq!(parse_value::<usize>("repeats", " 4 ").unwrap(), 4);
        match parse_value::<usize>("repeats", "four") {
            Err(AnalysisError::InvalidParameter { name, reason }) => {
                assert_eq!(name, "repeats");
                assert!(reason.contains("four"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
