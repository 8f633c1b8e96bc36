//! gpio-fan-rpm Core Library
//!
//! Measures fan speed by counting edges on Linux GPIO lines.
//!
//! # Features
//!
//! - **Edge Counting**: GPIO character device (uAPI v2) line requests with rising, falling or both edges
//! - **Parallel Channels**: One worker thread per line, up to ten lines per run
//! - **Round Barrier**: Multi-channel output is emitted complete and in request order
//! - **Watch Mode**: Continuous rounds with running min/max/average per line
//! - **Cancellation**: Shared stop flag set by Ctrl+C or the `q` key, seen within ~100 ms
//!
//! # Module Structure
//!
//! - `hw/` - GPIO chip and line access, edge source traits, phase timer
//! - `data/` - Data types, configuration, validation
//! - `engine/` - Channel workers, round barrier, statistics, drivers
//!
//! # Example
//!
//! ```no_run
//! use gfr_core::{run_single, CdevProvider, RunOptions, RunSettings, StopFlag};
//!
//! let settings = RunSettings {
//!     lines: vec![17],
//!     ..RunSettings::default()
//! };
//! let plan = settings.into_plan("gpiochip0");
//! let provider = CdevProvider::new("gpiochip0").unwrap();
//! let stop = StopFlag::new();
//! let mut out = std::io::stdout().lock();
//! run_single(&plan, &provider, &stop, &mut out, &RunOptions::default()).unwrap();
//! ```

// Grouped modules
pub mod data;
pub mod engine;
pub mod hw;

// Standalone modules
pub mod cancel;
pub mod constants;
pub mod display;
pub mod error;
pub mod monitor;

// Re-export primary types from data/
pub use data::{
    ChannelConfig, EdgeMode, EnvDefaults, MeasurementPlan, Outcome, OutputMode, Reading,
    RunSettings, Sample,
};

// Re-export validation functions from data/
pub use data::{
    validate_duration, validate_line, validate_lines, validate_pulses, validate_warmup,
    validate_window,
};

// Re-export error types
pub use error::{FanRpmError, Result};

pub use cancel::StopFlag;

// Re-export engine types
pub use engine::{
    compute_rpm, run_single, run_watch, ChannelWorker, MeasurementContext, RoundStatus,
    RpmStats, RunOptions, RunSummary, StatsTracker,
};

// Re-export hardware types from hw/
pub use hw::{
    auto_detect_chip, consumer_label, CdevProvider, ChipInfo, EdgeLine, EdgeLineProvider,
    GpioChip, PhaseDeadline, WaitOutcome,
};

pub use display::Formatter;
pub use monitor::KeyboardMonitor;
