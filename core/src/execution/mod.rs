//! Run lifecycle: cancellation, status reporting and iteration tracking
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod cancellation;
pub mod monitor;
pub mod runner;
pub mod tracker;

pub use self::cancellation::CancellationToken;
pub use self::monitor::{LogSink, MemorySink, Progress, RunControl, RunSettings, StatusSink};
pub use self::runner::execute;
pub use self::tracker::{IterationLimits, RunTracker};
