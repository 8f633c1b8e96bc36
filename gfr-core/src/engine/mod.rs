//! Measurement engine modules
//!
//! Channel workers, the round barrier, running statistics and the two
//! drivers (watch and single-shot) that tie them together.

mod context;
mod driver;
mod single;
mod stats;
mod watch;
mod worker;

pub use context::{MeasurementContext, RoundStatus};
pub use driver::{RunOptions, RunSummary};
pub use single::run_single;
pub use stats::{RpmStats, StatsTracker};
pub use watch::run_watch;
pub use worker::{compute_rpm, ChannelWorker};
