//! Watch mode driver
//!
//! One long-lived thread per channel measures round after round and records
//! into the shared table. The driver thread waits for each complete round,
//! folds it into the statistics and writes it out in plan order before the
//! table is cleared for the next one. A keyboard monitor thread lets the
//! user stop with `q`.

use std::io::Write;
use std::thread;

use tracing::{debug, error, info, warn};

use super::context::{MeasurementContext, RoundStatus};
use super::driver::{collect_readings, emit, new_context, open_workers, RunOptions, RunSummary};
use super::stats::StatsTracker;
use super::worker::ChannelWorker;
use crate::cancel::StopFlag;
use crate::data::MeasurementPlan;
use crate::display::Formatter;
use crate::error::{FanRpmError, Result};
use crate::hw::EdgeLineProvider;
use crate::monitor::KeyboardMonitor;

/// Body of one channel thread
fn watch_channel(index: usize, mut worker: ChannelWorker, ctx: &MeasurementContext, prime: bool) {
    let line = worker.config().line;

    let primed = !prime || {
        debug!("GPIO {}: priming measurement", line);
        !worker.measure().is_interrupted()
    };

    if primed {
        loop {
            let outcome = worker.measure();
            if outcome.is_interrupted() {
                break;
            }
            if !ctx.record(index, outcome) {
                break;
            }
        }
    }

    debug!("GPIO {}: worker finished", line);
    ctx.wake();
}

/// Emit rounds until stopped; returns the number written
fn drive_rounds<W: Write>(
    ctx: &MeasurementContext,
    plan: &MeasurementPlan,
    formatter: &Formatter,
    stats: &mut StatsTracker,
    out: &mut W,
) -> Result<u64> {
    let mut rounds = 0u64;

    loop {
        match ctx.await_round() {
            RoundStatus::Complete => {}
            RoundStatus::Stopped => {
                debug!("stop requested after {} rounds", rounds);
                break;
            }
            RoundStatus::NoChannels => {
                warn!("no GPIO line could be requested, stopping");
                break;
            }
        }

        let round = ctx.snapshot();
        if let Some(readings) = collect_readings(plan, &round, Some(&mut *stats)) {
            let text = formatter.format_round(&readings)?;
            emit(out, &text)?;
            rounds += 1;
        }
        ctx.reset_round();
    }

    Ok(rounds)
}

/// Measure continuously until `stop` is set.
///
/// `stop` is always set when this returns so every thread started here has
/// exited by then.
pub fn run_watch<W: Write>(
    plan: &MeasurementPlan,
    provider: &dyn EdgeLineProvider,
    stop: &StopFlag,
    out: &mut W,
    options: &RunOptions,
) -> Result<RunSummary> {
    let ctx = new_context(plan.channels.len(), stop, options);
    let (workers, failed_lines) = open_workers(plan, provider, stop, &ctx, options);
    let formatter = Formatter::new(plan.output, plan.interval_secs(), plan.channels.len());
    let mut stats = StatsTracker::new(plan.channels.len());

    let rounds = thread::scope(|scope| {
        let ctx = &ctx;
        let mut handles = Vec::with_capacity(workers.len());
        let mut spawn_error = None;

        for (index, worker) in workers {
            let name = format!("gpio{}", worker.config().line);
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn_scoped(scope, move || watch_channel(index, worker, ctx, options.prime));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_error = Some(FanRpmError::ThreadSpawn { what: name, source });
                    break;
                }
            }
        }

        let monitor = if options.keyboard && spawn_error.is_none() {
            let monitor = KeyboardMonitor::new(stop.clone());
            match thread::Builder::new()
                .name("keyboard".into())
                .spawn_scoped(scope, move || monitor.run())
            {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("cannot start keyboard monitor: {}; use Ctrl+C to quit", e);
                    None
                }
            }
        } else {
            None
        };

        let result = match spawn_error {
            Some(e) => Err(e),
            None => drive_rounds(ctx, plan, &formatter, &mut stats, out),
        };

        stop.set();
        ctx.wake();
        for handle in handles {
            if handle.join().is_err() {
                error!("channel worker panicked");
            }
        }
        if let Some(handle) = monitor {
            if handle.join().is_err() {
                error!("keyboard monitor panicked");
            }
        }

        result
    })?;

    info!("watch mode stopped after {} rounds", rounds);
    Ok(RunSummary {
        rounds,
        failed_lines,
    })
}
