//! Iteration bookkeeping shared by both solvers
//!
//! A [`RunTracker`] owns the counters behind the termination rules, decides
//! when a progress snapshot is due and drives the status transitions of the
//! run record through the [`StatusSink`].
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::time::Instant;

use log::{debug, info, warn};

use crate::algorithm::traits::{AlgorithmKind, AnalysisError, RunStatus, StopReason};
use crate::data_structures::control_path::{ArchiveUpdate, SolutionArchive};
use crate::execution::cancellation::CancellationToken;
use crate::execution::monitor::{Progress, ProgressClock, RunControl, RunSettings, StatusSink};

/// Iteration limits of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationLimits {
    pub maximum_iterations: usize,
    pub maximum_iterations_without_improvement: usize,
}

pub struct RunTracker<'a> {
    algorithm: AlgorithmKind,
    sink: &'a mut dyn StatusSink,
    token: &'a CancellationToken,
    clock: ProgressClock,
    started: Instant,
    limits: IterationLimits,
    iteration: usize,
    without_improvement: usize,
}

impl<'a> RunTracker<'a> {
    pub fn new(
        algorithm: AlgorithmKind,
        sink: &'a mut dyn StatusSink,
        token: &'a CancellationToken,
        settings: RunSettings,
        limits: IterationLimits,
    ) -> Self {
        Self {
            algorithm,
            sink,
            token,
            clock: ProgressClock::new(settings.progress_interval),
            started: Instant::now(),
            limits,
            iteration: 0,
            without_improvement: 0,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn without_improvement(&self) -> usize {
        self.without_improvement
    }

    pub fn token(&self) -> &CancellationToken {
        self.token
    }

    /// Appends a line to the run log, prefixed with the elapsed run time
    pub fn log(&mut self, message: &str) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.sink.log(&format!("[{:>10.3}s] {}", elapsed, message));
    }

    pub fn initialize(&mut self) {
        self.sink.set_status(RunStatus::Initializing);
        let message = format!("Initializing the {} analysis.", self.algorithm);
        self.log(&message);
    }

    /// Reports a fatal input error; no iteration is consumed
    pub fn fail(&mut self, error: &AnalysisError) {
        warn!("{} analysis rejected: {}", self.algorithm, error);
        let message = format!("An error occurred: {}", error);
        self.log(&message);
        self.sink.set_status(RunStatus::Error);
    }

    pub fn start(&mut self, summary: &str) {
        info!("{} analysis started: {}", self.algorithm, summary);
        self.log(summary);
        self.sink.set_status(RunStatus::Ongoing);
    }

    /// Termination check performed once at the top of every iteration
    pub fn check_stop(&mut self) -> Option<StopReason> {
        if self.iteration >= self.limits.maximum_iterations {
            return Some(StopReason::MaximumIterations);
        }
        if self.without_improvement >= self.limits.maximum_iterations_without_improvement {
            return Some(StopReason::WithoutImprovement);
        }
        if self.token.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.sink.poll() {
            RunControl::Continue => None,
            RunControl::StopRequested => Some(StopReason::StopRequested),
            RunControl::Vanished => Some(StopReason::RecordVanished),
        }
    }

    /// Counts an iteration once its candidate exists; a pass abandoned
    /// through cancellation is never counted
    pub fn begin_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn record(&mut self, update: ArchiveUpdate, archive: &SolutionArchive) {
        if update.is_improvement() {
            self.without_improvement = 0;
            debug!(
                "{} iteration {}: improved to {:?} driver(s)",
                self.algorithm,
                self.iteration,
                archive.best_count()
            );
            let message = format!(
                "Iteration {}: found a solution with {} driver node(s).",
                self.iteration,
                archive.best_count().unwrap_or(0)
            );
            self.log(&message);
        } else {
            self.without_improvement += 1;
        }
    }

    fn snapshot(&self, archive: &SolutionArchive) -> Progress {
        Progress {
            iteration: self.iteration,
            iterations_without_improvement: self.without_improvement,
            best_driver_count: archive.best_count(),
            solution_count: archive.len(),
        }
    }

    /// Publishes a progress snapshot if the progress interval has elapsed
    pub fn publish(&mut self, archive: &SolutionArchive) {
        if self.clock.is_due() {
            let progress = self.snapshot(archive);
            self.sink.report_progress(&progress);
        }
    }

    /// Final snapshot and terminal status; a vanished record gets neither
    pub fn finish(mut self, reason: StopReason, archive: &SolutionArchive) -> RunStatus {
        let status = reason.status();
        info!(
            "{} analysis ended after {} iteration(s): {}",
            self.algorithm,
            self.iteration,
            reason.describe()
        );
        if reason == StopReason::RecordVanished {
            return status;
        }

        let progress = self.snapshot(archive);
        self.sink.report_progress(&progress);
        let message = format!(
            "The analysis ended with the status \"{}\" because {}.",
            status,
            reason.describe()
        );
        self.log(&message);
        self.sink.set_status(status);
        status
    }
}
