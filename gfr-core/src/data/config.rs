//! Run configuration
//!
//! Merges environment defaults with explicit settings, validates the result
//! and turns it into a `MeasurementPlan` once the chip is known.

use std::time::Duration;

use crate::constants::{defaults, env};
use crate::data::types::{ChannelConfig, EdgeMode, MeasurementPlan, OutputMode};
use crate::data::validation::{
    validate_duration, validate_lines, validate_pulses, validate_warmup, validate_window,
};
use crate::error::Result;

/// Defaults taken from the environment.
///
/// Values that do not parse as integers are ignored silently; range checks
/// happen later together with the command-line values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvDefaults {
    pub duration: u32,
    pub pulses: u32,
    pub warmup: u32,
    pub debug: bool,
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            duration: defaults::DURATION_SECS,
            pulses: defaults::PULSES_PER_REV,
            warmup: defaults::WARMUP_SECS,
            debug: false,
        }
    }
}

impl EnvDefaults {
    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = Self::default();
        let int = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u32>().ok());

        if let Some(v) = int(env::DURATION) {
            out.duration = v;
        }
        if let Some(v) = int(env::PULSES) {
            out.pulses = v;
        }
        if let Some(v) = int(env::WARMUP) {
            out.warmup = v;
        }
        out.debug = matches!(lookup(env::DEBUG).as_deref(), Some("1") | Some("true"));
        out
    }
}

/// Fully merged settings of one process run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub lines: Vec<u32>,
    /// `None` means auto-detect from the first line
    pub chip: Option<String>,
    pub duration_secs: u32,
    pub warmup_secs: u32,
    pub pulses_per_rev: u32,
    pub edge: EdgeMode,
    pub output: OutputMode,
    pub watch: bool,
    pub debug: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            chip: None,
            duration_secs: defaults::DURATION_SECS,
            warmup_secs: defaults::WARMUP_SECS,
            pulses_per_rev: defaults::PULSES_PER_REV,
            edge: EdgeMode::default(),
            output: OutputMode::default(),
            watch: false,
            debug: false,
        }
    }
}

impl RunSettings {
    /// Apply every range and consistency check, truncating over-long line lists
    pub fn validate(mut self) -> Result<Self> {
        self.lines = validate_lines(&self.lines)?;
        validate_duration(self.duration_secs)?;
        validate_warmup(self.warmup_secs)?;
        validate_pulses(self.pulses_per_rev)?;
        validate_window(self.duration_secs, self.warmup_secs)?;
        Ok(self)
    }

    /// Build the per-channel configuration once the chip name is resolved
    pub fn into_plan(self, chip: &str) -> MeasurementPlan {
        let channels = self
            .lines
            .iter()
            .map(|&line| ChannelConfig {
                line,
                chip: chip.to_string(),
                pulses_per_rev: self.pulses_per_rev,
                edge: self.edge,
                duration: Duration::from_secs(u64::from(self.duration_secs)),
                warmup: Duration::from_secs(u64::from(self.warmup_secs)),
            })
            .collect();

        MeasurementPlan {
            channels,
            output: self.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn settings() -> RunSettings {
        RunSettings {
            lines: vec![18, 17, 19],
            chip: None,
            duration_secs: 2,
            warmup_secs: 1,
            pulses_per_rev: 4,
            edge: EdgeMode::Both,
            output: OutputMode::Human,
            watch: false,
            debug: false,
        }
    }

    #[test]
    fn test_env_defaults_without_overrides() {
        let d = EnvDefaults::from_lookup(lookup_from(&[]));
        assert_eq!(d, EnvDefaults::default());
        assert_eq!(d.duration, 2);
        assert_eq!(d.pulses, 4);
        assert_eq!(d.warmup, 1);
        assert!(!d.debug);
    }

    #[test]
    fn test_env_defaults_overrides() {
        let d = EnvDefaults::from_lookup(lookup_from(&[
            ("GPIO_FAN_RPM_DURATION", "5"),
            ("GPIO_FAN_RPM_PULSES", "2"),
            ("GPIO_FAN_RPM_WARMUP", "0"),
            ("DEBUG", "true"),
        ]));
        assert_eq!(d.duration, 5);
        assert_eq!(d.pulses, 2);
        assert_eq!(d.warmup, 0);
        assert!(d.debug);
    }

    #[test]
    fn test_env_defaults_ignore_garbage() {
        let d = EnvDefaults::from_lookup(lookup_from(&[
            ("GPIO_FAN_RPM_DURATION", "fast"),
            ("GPIO_FAN_RPM_PULSES", "-3"),
            ("DEBUG", "yes"),
        ]));
        assert_eq!(d.duration, 2);
        assert_eq!(d.pulses, 4);
        assert!(!d.debug);
    }

    #[test]
    fn test_validate_keeps_order() {
        let s = settings().validate().unwrap();
        assert_eq!(s.lines, vec![18, 17, 19]);
    }

    #[test]
    fn test_validate_rejects_short_window() {
        let mut s = settings();
        s.duration_secs = 1;
        s.warmup_secs = 1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_into_plan() {
        let plan = settings().validate().unwrap().into_plan("gpiochip0");
        assert_eq!(plan.lines(), vec![18, 17, 19]);
        let ch = &plan.channels[0];
        assert_eq!(ch.chip, "gpiochip0");
        assert_eq!(ch.duration, Duration::from_secs(2));
        assert_eq!(ch.warmup, Duration::from_secs(1));
        assert_eq!(ch.measurement_window(), Duration::from_secs(1));
    }
}
