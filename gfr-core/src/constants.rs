//! Constants and configuration values for gpio-fan-rpm
//!
//! Centralizes the limits, defaults, intervals and device paths used by
//! the measurement engine and the command-line front end.

use std::time::Duration;

/// Polling and wake-up intervals
pub mod timing {
    use super::Duration;

    /// Longest a worker blocks on a line before re-checking the stop flag
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Ceiling on how long the driver waits for a round before re-checking the stop flag
    pub const ROUND_RECHECK_INTERVAL: Duration = Duration::from_secs(1);

    /// Keyboard poll interval of the cancellation monitor (~10 Hz)
    pub const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// Accepted ranges for user configuration
pub mod limits {
    /// Highest GPIO line number accepted on the command line
    pub const MAX_LINE: u32 = 999;

    /// Maximum number of channels measured in one run
    pub const MAX_CHANNELS: usize = 10;

    pub const MIN_DURATION_SECS: u32 = 1;
    pub const MAX_DURATION_SECS: u32 = 3600;

    pub const MAX_WARMUP_SECS: u32 = 60;

    pub const MIN_PULSES: u32 = 1;
    pub const MAX_PULSES: u32 = 100;
}

/// Defaults applied when neither the command line nor the environment sets a value
pub mod defaults {
    pub const DURATION_SECS: u32 = 2;
    pub const PULSES_PER_REV: u32 = 4;
    pub const WARMUP_SECS: u32 = 1;
}

/// Environment variables that override the defaults
pub mod env {
    pub const DURATION: &str = "GPIO_FAN_RPM_DURATION";
    pub const PULSES: &str = "GPIO_FAN_RPM_PULSES";
    pub const WARMUP: &str = "GPIO_FAN_RPM_WARMUP";
    pub const DEBUG: &str = "DEBUG";
}

/// GPIO character device locations
pub mod gpio {
    /// Directory holding the gpiochip device nodes
    pub const DEV_DIR: &str = "/dev";

    /// Device node name prefix
    pub const CHIP_PREFIX: &str = "gpiochip";

    /// Auto-detection probes gpiochip0 through gpiochip9
    pub const AUTODETECT_CHIPS: u32 = 10;

    /// Consumer label prefix; the process id is appended
    pub const CONSUMER_PREFIX: &str = "gpio-fan-rpm";
}

/// Interactive quit key of the watch mode (matched case-insensitively)
pub const QUIT_KEY: char = 'q';
