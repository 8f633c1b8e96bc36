//! Pieces shared by the watch and single-shot drivers

use std::io::Write;
use std::time::Duration;

use tracing::{debug, error};

use super::context::MeasurementContext;
use super::stats::StatsTracker;
use super::worker::ChannelWorker;
use crate::cancel::StopFlag;
use crate::constants::timing;
use crate::data::{MeasurementPlan, Outcome, Reading};
use crate::error::{FanRpmError, Result};
use crate::hw::EdgeLineProvider;

/// Tunables for a driver run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on how long the driver waits before re-checking the stop flag
    pub recheck_interval: Duration,
    /// Upper bound on each blocking wait inside a worker
    pub poll_interval: Duration,
    /// Start the keyboard quit monitor (watch mode only)
    pub keyboard: bool,
    /// Run and discard one measurement per channel before the first round (watch mode only)
    pub prime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            recheck_interval: timing::ROUND_RECHECK_INTERVAL,
            poll_interval: timing::POLL_INTERVAL,
            keyboard: true,
            prime: true,
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rounds written to the output
    pub rounds: u64,
    /// Lines whose request failed, in plan order
    pub failed_lines: Vec<u32>,
}

impl RunSummary {
    /// No channel failed to open
    pub fn is_clean(&self) -> bool {
        self.failed_lines.is_empty()
    }
}

pub(crate) fn new_context(channels: usize, stop: &StopFlag, options: &RunOptions) -> MeasurementContext {
    MeasurementContext::new(channels, stop.clone())
        .with_recheck_interval(options.recheck_interval)
        .with_poll_interval(options.poll_interval)
}

/// Request every line of the plan. Failed channels are logged, excluded from
/// the barrier and reported by line number.
pub(crate) fn open_workers(
    plan: &MeasurementPlan,
    provider: &dyn EdgeLineProvider,
    stop: &StopFlag,
    ctx: &MeasurementContext,
    options: &RunOptions,
) -> (Vec<(usize, ChannelWorker)>, Vec<u32>) {
    let mut workers = Vec::with_capacity(plan.channels.len());
    let mut failed = Vec::new();

    for (index, channel) in plan.channels.iter().enumerate() {
        match ChannelWorker::open(provider, channel.clone(), stop.clone()) {
            Ok(worker) => {
                debug!(
                    "GPIO {}: requested on {} ({} edges, {} pulses/rev)",
                    channel.line, channel.chip, channel.edge, channel.pulses_per_rev
                );
                workers.push((index, worker.with_poll_interval(options.poll_interval)));
            }
            Err(e) => {
                error!("{}", e);
                ctx.exclude(index);
                failed.push(channel.line);
            }
        }
    }

    (workers, failed)
}

/// Turn a round snapshot into readings in plan order.
///
/// Returns `None` if any channel was interrupted: a partial round is never
/// shown and does not touch the statistics. Excluded channels are skipped.
pub(crate) fn collect_readings(
    plan: &MeasurementPlan,
    round: &[Option<Outcome>],
    mut stats: Option<&mut StatsTracker>,
) -> Option<Vec<Reading>> {
    if round.iter().flatten().any(Outcome::is_interrupted) {
        return None;
    }

    let mut readings = Vec::with_capacity(round.len());
    for (index, (channel, slot)) in plan.channels.iter().zip(round).enumerate() {
        let Some(sample) = slot.as_ref().and_then(Outcome::sample) else {
            continue;
        };
        let totals = stats
            .as_deref_mut()
            .map(|tracker| tracker.update(index, sample.rpm));
        readings.push(Reading {
            line: channel.line,
            rpm: sample.rpm,
            stats: totals,
        });
    }
    Some(readings)
}

/// Write one formatted round with a single write and flush
pub(crate) fn emit<W: Write>(out: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(FanRpmError::Output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChannelConfig, EdgeMode, OutputMode, Sample};

    fn plan(lines: &[u32]) -> MeasurementPlan {
        MeasurementPlan {
            channels: lines
                .iter()
                .map(|&line| ChannelConfig {
                    line,
                    chip: "gpiochip0".into(),
                    pulses_per_rev: 4,
                    edge: EdgeMode::Both,
                    duration: Duration::from_secs(2),
                    warmup: Duration::from_secs(1),
                })
                .collect(),
            output: OutputMode::Human,
        }
    }

    fn done(rpm: f64) -> Option<Outcome> {
        Some(Outcome::Completed(Sample {
            pulses: 1,
            elapsed: Duration::from_secs(1),
            rpm,
        }))
    }

    #[test]
    fn test_readings_follow_plan_order() {
        let plan = plan(&[18, 17, 19]);
        let readings = collect_readings(&plan, &[done(1.0), done(2.0), done(3.0)], None).unwrap();
        let lines: Vec<u32> = readings.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![18, 17, 19]);
        assert!(readings.iter().all(|r| r.stats.is_none()));
    }

    #[test]
    fn test_interrupted_round_is_dropped() {
        let plan = plan(&[17, 18]);
        let mut stats = StatsTracker::new(2);
        let round = [done(900.0), Some(Outcome::Interrupted)];
        assert!(collect_readings(&plan, &round, Some(&mut stats)).is_none());
        assert_eq!(stats.get(0).unwrap().count(), 0);
    }

    #[test]
    fn test_excluded_slot_is_skipped() {
        let plan = plan(&[17, 18]);
        let readings = collect_readings(&plan, &[None, done(5.0)], None).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].line, 18);
    }

    #[test]
    fn test_stats_attached_in_watch() {
        let plan = plan(&[17]);
        let mut stats = StatsTracker::new(1);
        collect_readings(&plan, &[done(800.0)], Some(&mut stats));
        let readings = collect_readings(&plan, &[done(1000.0)], Some(&mut stats)).unwrap();
        let totals = readings[0].stats.unwrap();
        assert_eq!(totals.min(), 800.0);
        assert_eq!(totals.max(), 1000.0);
        assert_eq!(totals.average(), 900.0);
    }

    #[test]
    fn test_emit_skips_empty() {
        let mut out = Vec::new();
        emit(&mut out, "").unwrap();
        assert!(out.is_empty());
        emit(&mut out, "GPIO17: RPM: 900\n").unwrap();
        assert_eq!(out, b"GPIO17: RPM: 900\n");
    }
}
