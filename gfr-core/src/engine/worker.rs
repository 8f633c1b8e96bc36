//! Channel worker
//!
//! Runs one measurement on one line:
//!
//! 1. **Warmup** (optional): edges are waited for and discarded so the fan
//!    can settle. A stop request ends the measurement right here.
//! 2. **Measurement**: edges are counted until the phase deadline fires.
//! 3. **RPM**: computed from the monotonic time that actually elapsed, not
//!    the nominal window.
//!
//! Every blocking wait is capped at the poll interval so the stop flag is
//! seen within ~100 ms. A read failure is not fatal: counting stops and the
//! partial count over the partial window is reported.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cancel::StopFlag;
use crate::constants::timing;
use crate::data::{ChannelConfig, Outcome, Sample};
use crate::error::{FanRpmError, Result};
use crate::hw::{EdgeLine, EdgeLineProvider, PhaseDeadline, WaitOutcome};

/// Convert an edge count over `elapsed_secs` into revolutions per minute.
///
/// Returns 0.0 for a non-positive elapsed time.
pub fn compute_rpm(pulses: u64, pulses_per_rev: u32, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 || pulses_per_rev == 0 {
        return 0.0;
    }
    let revolutions = pulses as f64 / f64::from(pulses_per_rev);
    revolutions / elapsed_secs * 60.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Warmup,
    Measurement,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => f.write_str("Warmup"),
            Phase::Measurement => f.write_str("Measurement"),
        }
    }
}

enum PhaseEnd {
    Completed,
    Interrupted,
    ReadError(FanRpmError),
}

struct PhaseReport {
    end: PhaseEnd,
    pulses: u64,
}

/// Count edges on `line` until `window` elapses, the stop flag is set, or a
/// read fails
fn run_phase(
    line: &mut dyn EdgeLine,
    window: Duration,
    stop: &StopFlag,
    poll_interval: Duration,
    phase: Phase,
) -> PhaseReport {
    debug!(
        "GPIO {}: {} phase: {:.1} seconds",
        line.line(),
        phase,
        window.as_secs_f64()
    );

    let mut deadline = PhaseDeadline::arm(window);
    let mut pulses = 0u64;

    loop {
        if stop.is_set() {
            return PhaseReport { end: PhaseEnd::Interrupted, pulses };
        }
        if deadline.expired() {
            return PhaseReport { end: PhaseEnd::Completed, pulses };
        }

        let slice = deadline.remaining().min(poll_interval);
        match line.wait(slice) {
            Ok(WaitOutcome::Event) => match line.consume() {
                Ok(n) => pulses += n,
                Err(e) => return PhaseReport { end: PhaseEnd::ReadError(e), pulses },
            },
            Ok(WaitOutcome::Timeout) => {}
            Err(e) => return PhaseReport { end: PhaseEnd::ReadError(e), pulses },
        }
    }
}

/// Measures one channel, reusing its line handle across calls
pub struct ChannelWorker {
    config: ChannelConfig,
    line: Box<dyn EdgeLine>,
    stop: StopFlag,
    poll_interval: Duration,
}

impl ChannelWorker {
    pub fn new(config: ChannelConfig, line: Box<dyn EdgeLine>, stop: StopFlag) -> Self {
        Self {
            config,
            line,
            stop,
            poll_interval: timing::POLL_INTERVAL,
        }
    }

    /// Open the channel's line through `provider`
    pub fn open(
        provider: &dyn EdgeLineProvider,
        config: ChannelConfig,
        stop: StopFlag,
    ) -> Result<Self> {
        let line = provider.open(&config)?;
        Ok(Self::new(config, line, stop))
    }

    /// Override how often blocking waits return to check the stop flag
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Run warmup and measurement once and report the outcome
    pub fn measure(&mut self) -> Outcome {
        let gpio = self.config.line;

        if !self.config.warmup.is_zero() {
            let warmup = run_phase(
                self.line.as_mut(),
                self.config.warmup,
                &self.stop,
                self.poll_interval,
                Phase::Warmup,
            );
            match warmup.end {
                PhaseEnd::Interrupted => return Outcome::Interrupted,
                PhaseEnd::ReadError(e) => warn!("GPIO {}: {}; ending warmup early", gpio, e),
                PhaseEnd::Completed => {}
            }
        }

        let start = Instant::now();
        let report = run_phase(
            self.line.as_mut(),
            self.config.measurement_window(),
            &self.stop,
            self.poll_interval,
            Phase::Measurement,
        );
        let elapsed = start.elapsed();

        let sample = Sample {
            pulses: report.pulses,
            elapsed,
            rpm: compute_rpm(report.pulses, self.config.pulses_per_rev, elapsed.as_secs_f64()),
        };

        match report.end {
            PhaseEnd::Interrupted => Outcome::Interrupted,
            PhaseEnd::Completed => {
                log_sample(gpio, self.config.pulses_per_rev, &sample);
                Outcome::Completed(sample)
            }
            PhaseEnd::ReadError(e) => {
                warn!(
                    "GPIO {}: {}; reporting {} pulses over {:.3} s",
                    gpio,
                    e,
                    sample.pulses,
                    elapsed.as_secs_f64()
                );
                Outcome::ReadError(sample)
            }
        }
    }
}

fn log_sample(gpio: u32, pulses_per_rev: u32, sample: &Sample) {
    let secs = sample.elapsed.as_secs_f64();
    debug!(
        "GPIO {}: Counted {} pulses in {:.3} s, RPM={:.1}",
        gpio, sample.pulses, secs, sample.rpm
    );
    if secs > 0.0 {
        debug!(
            "GPIO {}: pulses per revolution {}, revolutions {:.2}, frequency {:.2} Hz",
            gpio,
            pulses_per_rev,
            sample.pulses as f64 / f64::from(pulses_per_rev),
            sample.pulses as f64 / secs
        );
    }
}
