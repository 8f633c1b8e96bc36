//! Single-shot driver
//!
//! Every channel is measured exactly once on its own thread. The round is
//! written only if no channel was interrupted.

use std::io::Write;
use std::thread;

use tracing::{error, info};

use super::driver::{collect_readings, emit, new_context, open_workers, RunOptions, RunSummary};
use crate::cancel::StopFlag;
use crate::data::MeasurementPlan;
use crate::display::Formatter;
use crate::error::{FanRpmError, Result};
use crate::hw::EdgeLineProvider;

/// Measure each channel once and write the result.
///
/// A stop flag that is already set still allows the attempt; it just ends
/// as soon as the worker sees the flag.
pub fn run_single<W: Write>(
    plan: &MeasurementPlan,
    provider: &dyn EdgeLineProvider,
    stop: &StopFlag,
    out: &mut W,
    options: &RunOptions,
) -> Result<RunSummary> {
    let ctx = new_context(plan.channels.len(), stop, options);
    let (workers, failed_lines) = open_workers(plan, provider, stop, &ctx, options);

    thread::scope(|scope| {
        let ctx = &ctx;
        let mut handles = Vec::with_capacity(workers.len());

        for (index, mut worker) in workers {
            let name = format!("gpio{}", worker.config().line);
            let spawned = thread::Builder::new().name(name.clone()).spawn_scoped(scope, move || {
                let outcome = worker.measure();
                ctx.record(index, outcome);
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // Cut the already running measurements short
                    stop.set();
                    return Err(FanRpmError::ThreadSpawn { what: name, source });
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                error!("channel worker panicked");
            }
        }
        Ok(())
    })?;

    let round = ctx.snapshot();
    let rounds = match collect_readings(plan, &round, None) {
        Some(readings) if !readings.is_empty() => {
            let formatter =
                Formatter::new(plan.output, plan.interval_secs(), plan.channels.len());
            emit(out, &formatter.format_round(&readings)?)?;
            1
        }
        Some(_) => 0,
        None => {
            info!("measurement interrupted, nothing to report");
            0
        }
    };

    Ok(RunSummary {
        rounds,
        failed_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChannelConfig, EdgeMode, OutputMode};
    use crate::hw::{EdgeLine, MockEdgeLine, WaitOutcome};
    use std::time::Duration;

    struct MockProvider;

    impl EdgeLineProvider for MockProvider {
        fn open(&self, channel: &ChannelConfig) -> Result<Box<dyn EdgeLine>> {
            if channel.line == 99 {
                return Err(FanRpmError::line_request(99, "Device or resource busy"));
            }
            let line = channel.line;
            let mut mock = MockEdgeLine::new();
            mock.expect_line().return_const(line);
            mock.expect_wait().returning(|timeout| {
                std::thread::sleep(timeout.min(Duration::from_millis(5)));
                Ok(WaitOutcome::Event)
            });
            mock.expect_consume().returning(|| Ok(1));
            Ok(Box::new(mock))
        }
    }

    fn plan(lines: &[u32]) -> MeasurementPlan {
        MeasurementPlan {
            channels: lines
                .iter()
                .map(|&line| ChannelConfig {
                    line,
                    chip: "gpiochip0".into(),
                    pulses_per_rev: 2,
                    edge: EdgeMode::Rising,
                    duration: Duration::from_millis(100),
                    warmup: Duration::ZERO,
                })
                .collect(),
            output: OutputMode::Human,
        }
    }

    #[test]
    fn test_single_round_written() {
        let mut out = Vec::new();
        let summary = run_single(
            &plan(&[17, 18]),
            &MockProvider,
            &StopFlag::new(),
            &mut out,
            &RunOptions::default(),
        )
        .unwrap();

        assert_eq!(summary.rounds, 1);
        assert!(summary.is_clean());
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("GPIO17: RPM: "));
        assert!(lines[1].starts_with("GPIO18: RPM: "));
    }

    #[test]
    fn test_failed_line_reported_siblings_measured() {
        let mut out = Vec::new();
        let summary = run_single(
            &plan(&[99, 17]),
            &MockProvider,
            &StopFlag::new(),
            &mut out,
            &RunOptions::default(),
        )
        .unwrap();

        assert_eq!(summary.failed_lines, vec![99]);
        assert!(!summary.is_clean());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("GPIO17: RPM: "));
        assert!(!text.contains("GPIO99"));
    }

    #[test]
    fn test_stop_before_start_prints_nothing() {
        let stop = StopFlag::new();
        stop.set();
        let mut out = Vec::new();
        let summary = run_single(&plan(&[17]), &MockProvider, &stop, &mut out, &RunOptions::default())
            .unwrap();
        assert_eq!(summary.rounds, 0);
        assert!(out.is_empty());
    }
}
