//! Core data types for gpio-fan-rpm
//!
//! Channel configuration, measurement outcomes and the per-round readings
//! handed to the output formatter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::FanRpmError;

/// Which signal transitions are counted as pulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    Rising,
    Falling,
    #[default]
    Both,
}

impl EdgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMode::Rising => "rising",
            EdgeMode::Falling => "falling",
            EdgeMode::Both => "both",
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeMode {
    type Err = FanRpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(EdgeMode::Rising),
            "falling" => Ok(EdgeMode::Falling),
            "both" => Ok(EdgeMode::Both),
            other => Err(FanRpmError::invalid_config(
                "edge",
                format!("invalid edge type '{}' (valid values: rising, falling, both)", other),
            )),
        }
    }
}

/// Output format of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Numeric,
    Json,
    Collectd,
}

/// Immutable per-run configuration of one monitored line
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Line offset on the chip
    pub line: u32,
    /// Chip device name, e.g. `gpiochip0`
    pub chip: String,
    pub pulses_per_rev: u32,
    pub edge: EdgeMode,
    /// Total window including warmup
    pub duration: Duration,
    pub warmup: Duration,
}

impl ChannelConfig {
    /// Length of the counting phase (`duration - warmup`)
    pub fn measurement_window(&self) -> Duration {
        self.duration.saturating_sub(self.warmup)
    }
}

/// Everything a driver needs to run: channels in output order plus the format
#[derive(Debug, Clone)]
pub struct MeasurementPlan {
    pub channels: Vec<ChannelConfig>,
    pub output: OutputMode,
}

impl MeasurementPlan {
    pub fn lines(&self) -> Vec<u32> {
        self.channels.iter().map(|c| c.line).collect()
    }

    /// Reporting interval in whole seconds (used by the collectd format)
    pub fn interval_secs(&self) -> u64 {
        self.channels
            .first()
            .map(|c| c.duration.as_secs())
            .unwrap_or(0)
    }
}

/// One computed RPM value with the raw numbers behind it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pulses: u64,
    pub elapsed: Duration,
    pub rpm: f64,
}

/// Result of a single `measure` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The measurement phase ran to its deadline
    Completed(Sample),
    /// A read failure cut the phase short; the sample covers the partial window
    ReadError(Sample),
    /// The stop flag was observed; never emitted
    Interrupted,
}

impl Outcome {
    pub fn sample(&self) -> Option<&Sample> {
        match self {
            Outcome::Completed(s) | Outcome::ReadError(s) => Some(s),
            Outcome::Interrupted => None,
        }
    }

    pub fn rpm(&self) -> Option<f64> {
        self.sample().map(|s| s.rpm)
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Outcome::Interrupted)
    }
}

/// One line of output: a channel, its RPM and (in watch mode) running stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub line: u32,
    pub rpm: f64,
    pub stats: Option<crate::engine::RpmStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(duration: u64, warmup: u64) -> ChannelConfig {
        ChannelConfig {
            line: 17,
            chip: "gpiochip0".into(),
            pulses_per_rev: 4,
            edge: EdgeMode::Both,
            duration: Duration::from_secs(duration),
            warmup: Duration::from_secs(warmup),
        }
    }

    #[test]
    fn test_measurement_window() {
        assert_eq!(channel(2, 1).measurement_window(), Duration::from_secs(1));
        assert_eq!(channel(5, 0).measurement_window(), Duration::from_secs(5));
    }

    #[test]
    fn test_edge_mode_parse() {
        assert_eq!("rising".parse::<EdgeMode>().unwrap(), EdgeMode::Rising);
        assert_eq!("falling".parse::<EdgeMode>().unwrap(), EdgeMode::Falling);
        assert_eq!("both".parse::<EdgeMode>().unwrap(), EdgeMode::Both);
        assert!("up".parse::<EdgeMode>().is_err());
        assert_eq!(EdgeMode::default(), EdgeMode::Both);
    }

    #[test]
    fn test_outcome_accessors() {
        let sample = Sample { pulses: 120, elapsed: Duration::from_secs(2), rpm: 900.0 };
        assert_eq!(Outcome::Completed(sample).rpm(), Some(900.0));
        assert_eq!(Outcome::ReadError(sample).rpm(), Some(900.0));
        assert_eq!(Outcome::Interrupted.rpm(), None);
        assert!(Outcome::Interrupted.is_interrupted());
    }

    #[test]
    fn test_plan_interval() {
        let plan = MeasurementPlan {
            channels: vec![channel(4, 1)],
            output: OutputMode::Collectd,
        };
        assert_eq!(plan.interval_secs(), 4);
        assert_eq!(plan.lines(), vec![17]);
    }
}
