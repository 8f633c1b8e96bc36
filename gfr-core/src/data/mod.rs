//! Data types, configuration, and validation modules

mod config;
mod types;
mod validation;

pub use config::{EnvDefaults, RunSettings};
pub use types::{
    ChannelConfig, EdgeMode, MeasurementPlan, Outcome, OutputMode, Reading, Sample,
};
pub use validation::{
    validate_duration, validate_line, validate_lines, validate_pulses, validate_warmup,
    validate_window,
};
