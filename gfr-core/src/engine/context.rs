//! Measurement context and round barrier
//!
//! The result table is the only mutable state shared between channel workers
//! and the driver. Each worker owns one slot; the driver waits until every
//! active slot holds an outcome, emits the round and then clears the slots.
//!
//! Waits on both sides are bounded so a set [`StopFlag`] is always noticed,
//! even if no worker will ever record again.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::cancel::StopFlag;
use crate::constants::timing;
use crate::data::Outcome;

/// Why [`MeasurementContext::await_round`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    /// Every active channel recorded an outcome
    Complete,
    /// The stop flag was set; the round may be partial
    Stopped,
    /// All channels were excluded, nothing will ever be recorded
    NoChannels,
}

#[derive(Debug)]
struct ResultTable {
    outcomes: Vec<Option<Outcome>>,
    complete: Vec<bool>,
    excluded: Vec<bool>,
}

impl ResultTable {
    fn new(channels: usize) -> Self {
        Self {
            outcomes: vec![None; channels],
            complete: vec![false; channels],
            excluded: vec![false; channels],
        }
    }

    fn active(&self) -> usize {
        self.excluded.iter().filter(|&&x| !x).count()
    }

    fn round_complete(&self) -> bool {
        self.complete
            .iter()
            .zip(&self.excluded)
            .all(|(&done, &excluded)| done || excluded)
    }
}

/// Shared result table plus the round barrier built on it
#[derive(Debug)]
pub struct MeasurementContext {
    table: Mutex<ResultTable>,
    round_done: Condvar,
    slot_freed: Condvar,
    stop: StopFlag,
    recheck_interval: Duration,
    poll_interval: Duration,
}

impl MeasurementContext {
    pub fn new(channels: usize, stop: StopFlag) -> Self {
        Self {
            table: Mutex::new(ResultTable::new(channels)),
            round_done: Condvar::new(),
            slot_freed: Condvar::new(),
            stop,
            recheck_interval: timing::ROUND_RECHECK_INTERVAL,
            poll_interval: timing::POLL_INTERVAL,
        }
    }

    /// How long the driver sleeps between stop flag checks
    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    /// How long a blocked `record` sleeps between stop flag checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of slots; fixed for the lifetime of the context
    pub fn len(&self) -> usize {
        self.table.lock().outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a channel's outcome for the current round.
    ///
    /// Blocks while the slot still holds an outcome the driver has not
    /// consumed. Returns `false` without storing anything if the stop flag
    /// was set while waiting.
    pub fn record(&self, index: usize, outcome: Outcome) -> bool {
        let mut table = self.table.lock();
        while table.complete[index] {
            if self.stop.is_set() {
                return false;
            }
            self.slot_freed.wait_for(&mut table, self.poll_interval);
        }

        table.outcomes[index] = Some(outcome);
        table.complete[index] = true;
        trace!("slot {} recorded", index);

        if table.round_complete() {
            self.round_done.notify_all();
        }
        true
    }

    /// Take a channel out of the barrier for good
    pub fn exclude(&self, index: usize) {
        let mut table = self.table.lock();
        table.excluded[index] = true;
        table.outcomes[index] = None;
        table.complete[index] = false;
        debug!("slot {} excluded, {} active", index, table.active());
        self.round_done.notify_all();
    }

    /// Wait until the round is complete or the stop flag is set
    pub fn await_round(&self) -> RoundStatus {
        let mut table = self.table.lock();
        loop {
            if self.stop.is_set() {
                return RoundStatus::Stopped;
            }
            if table.active() == 0 {
                return RoundStatus::NoChannels;
            }
            if table.round_complete() {
                return RoundStatus::Complete;
            }
            self.round_done.wait_for(&mut table, self.recheck_interval);
        }
    }

    /// Copy of every slot in channel order; `None` for excluded or empty slots
    pub fn snapshot(&self) -> Vec<Option<Outcome>> {
        self.table.lock().outcomes.clone()
    }

    /// Clear all slots and release workers waiting to record
    pub fn reset_round(&self) {
        let mut table = self.table.lock();
        table.outcomes.iter_mut().for_each(|o| *o = None);
        table.complete.iter_mut().for_each(|c| *c = false);
        self.slot_freed.notify_all();
    }

    /// Wake every waiter so it re-checks the stop flag now
    pub fn wake(&self) {
        let _table = self.table.lock();
        self.round_done.notify_all();
        self.slot_freed.notify_all();
    }

    /// Indices of excluded channels
    pub fn excluded(&self) -> Vec<usize> {
        let table = self.table.lock();
        table
            .excluded
            .iter()
            .enumerate()
            .filter_map(|(i, &x)| x.then_some(i))
            .collect()
    }
}
