//! Edge event source abstraction
//!
//! A channel worker only ever talks to these two traits. The GPIO character
//! device implements them in `chip.rs`; tests substitute scripted fakes.

use std::time::Duration;

use crate::data::ChannelConfig;
use crate::error::Result;

/// What a bounded wait on a line produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one edge is queued and can be consumed
    Event,
    /// The timeout elapsed with nothing queued
    Timeout,
}

/// An opened line delivering edge events. Dropping it releases the line.
#[cfg_attr(test, mockall::automock)]
pub trait EdgeLine: Send {
    /// Line offset this handle was opened for
    fn line(&self) -> u32;

    /// Block until an edge is queued or `timeout` elapses
    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome>;

    /// Drain queued edges and return how many were read
    fn consume(&mut self) -> Result<u64>;
}

/// Opens lines for channels; shared read-only by all workers
pub trait EdgeLineProvider: Sync {
    fn open(&self, channel: &ChannelConfig) -> Result<Box<dyn EdgeLine>>;
}
