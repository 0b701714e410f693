//! Status reporting between a solver run and the owner of its run record
//!
//! The run record itself lives outside the solver. A [`StatusSink`] is the
//! only channel to it: the solver pushes status transitions, free-text log
//! lines and progress snapshots, and polls once per iteration to learn
//! whether the record was stopped or deleted in the meantime.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::RunStatus;

/// Default spacing between progress snapshots
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Answer of the run-record owner when polled at an iteration boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunControl {
    Continue,
    /// The record was switched out of the ongoing state
    StopRequested,
    /// The record no longer exists
    Vanished,
}

/// Snapshot of a running search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub iteration: usize,
    pub iterations_without_improvement: usize,
    pub best_driver_count: Option<usize>,
    pub solution_count: usize,
}

/// Receiver of run status, log lines and progress
pub trait StatusSink {
    fn set_status(&mut self, status: RunStatus);

    fn log(&mut self, line: &str);

    fn report_progress(&mut self, progress: &Progress);

    /// Re-reads the run record; called once per iteration
    fn poll(&mut self) -> RunControl {
        RunControl::Continue
    }
}

/// Non-algorithmic knobs of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub progress_interval: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Decides when the next progress snapshot is due
#[derive(Debug, Clone)]
pub struct ProgressClock {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True on the first call and whenever the interval has elapsed since
    /// the last `true`
    pub fn is_due(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Sink that records everything in memory
///
/// Useful for tests and for callers that persist the record after the run.
/// Polls can be scripted to simulate the record being stopped or deleted.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub statuses: Vec<RunStatus>,
    pub lines: Vec<String>,
    pub progress: Vec<Progress>,
    polls: usize,
    script: Option<(usize, RunControl)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `control` from the `polls`-th poll onwards (1-based)
    pub fn interrupt_after(polls: usize, control: RunControl) -> Self {
        Self {
            script: Some((polls, control)),
            ..Self::default()
        }
    }

    pub fn last_status(&self) -> Option<RunStatus> {
        self.statuses.last().copied()
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl StatusSink for MemorySink {
    fn set_status(&mut self, status: RunStatus) {
        self.statuses.push(status);
    }

    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn report_progress(&mut self, progress: &Progress) {
        self.progress.push(progress.clone());
    }

    fn poll(&mut self) -> RunControl {
        self.polls += 1;
        match self.script {
            Some((after, control)) if self.polls >= after => control,
            _ => RunControl::Continue,
        }
    }
}

/// Sink that forwards everything to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn set_status(&mut self, status: RunStatus) {
        log::info!("run status: {}", status);
    }

    fn log(&mut self, line: &str) {
        log::info!("{}", line);
    }

    fn report_progress(&mut self, progress: &Progress) {
        log::info!(
            "iteration {} ({} without improvement), best driver count {:?}, {} solution(s)",
            progress.iteration,
            progress.iterations_without_improvement,
            progress.best_driver_count,
            progress.solution_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clock_first_call_is_due() {
        let mut clock = ProgressClock::new(Duration::from_secs(3600));
        assert!(clock.is_due());
        assert!(!clock.is_due());
    }

    #[test]
    fn test_progress_clock_zero_interval_is_always_due() {
        let mut clock = ProgressClock::new(Duration::ZERO);
        assert!(clock.is_due());
        assert!(clock.is_due());
    }

    #[test]
    fn test_memory_sink_scripted_polls() {
        let mut sink = MemorySink::interrupt_after(3, RunControl::Vanished);
        assert_eq!(sink.poll(), RunControl::Continue);
        assert_eq!(sink.poll(), RunControl::Continue);
        assert_eq!(sink.poll(), RunControl::Vanished);
        assert_eq!(sink.poll(), RunControl::Vanished);
        assert_eq!(sink.polls(), 4);
    }

    #[test]
    fn test_memory_sink_records() {
        let mut sink = MemorySink::new();
        sink.set_status(RunStatus::Initializing);
        sink.set_status(RunStatus::Ongoing);
        sink.log("hello");
        assert_eq!(sink.last_status(), Some(RunStatus::Ongoing));
        assert_eq!(sink.lines, vec!["hello".to_string()]);
    }
}
