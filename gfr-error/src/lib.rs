//! Unified error handling for gpio-fan-rpm
//!
//! This crate provides the single error type used by the measurement engine
//! and the command-line front end. It uses thiserror for the Display and
//! Error trait impls.

use std::io;

/// Result type alias using FanRpmError
pub type Result<T> = std::result::Result<T, FanRpmError>;

/// Unified error type for all gpio-fan-rpm operations
#[derive(thiserror::Error, Debug)]
pub enum FanRpmError {
    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("Failed to write output: {0}")]
    Output(io::Error),

    // ============================================================================
    // GPIO Chip and Line Errors
    // ============================================================================
    #[error("Cannot open chip '{chip}': {source}")]
    ChipOpen {
        chip: String,
        source: io::Error,
    },

    #[error("Cannot query chip '{chip}': {reason}")]
    ChipInfo {
        chip: String,
        reason: String,
    },

    #[error("Cannot auto-detect a GPIO chip providing line {0}")]
    ChipNotFound(u32),

    #[error("Cannot request events for GPIO {line}: {reason}")]
    LineRequest {
        line: u32,
        reason: String,
    },

    #[error("Error reading events for GPIO {line}: {reason}")]
    EventRead {
        line: u32,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("GPIO pin {0} specified multiple times")]
    DuplicateLine(u32),

    #[error("At least one --gpio required")]
    NoLines,

    // ============================================================================
    // Runtime Errors
    // ============================================================================
    #[error("Cannot start thread for {what}: {source}")]
    ThreadSpawn {
        what: String,
        source: io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FanRpmError {
    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a line request error
    pub fn line_request(line: u32, reason: impl Into<String>) -> Self {
        Self::LineRequest {
            line,
            reason: reason.into(),
        }
    }

    /// Create an event read error
    pub fn event_read(line: u32, reason: impl Into<String>) -> Self {
        Self::EventRead {
            line,
            reason: reason.into(),
        }
    }

    /// True for errors caused by invalid user configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::DuplicateLine(_) | Self::NoLines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        assert!(FanRpmError::NoLines.is_config());
        assert!(FanRpmError::DuplicateLine(17).is_config());
        assert!(FanRpmError::invalid_config("duration", "must be at least 1 second").is_config());
        assert!(!FanRpmError::line_request(17, "busy").is_config());
        assert!(!FanRpmError::ChipNotFound(17).is_config());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            FanRpmError::DuplicateLine(18).to_string(),
            "GPIO pin 18 specified multiple times"
        );
        assert_eq!(
            FanRpmError::invalid_config("pulses", "must be between 1 and 100").to_string(),
            "Invalid value for pulses: must be between 1 and 100"
        );
        assert_eq!(
            FanRpmError::event_read(4, "EIO").to_string(),
            "Error reading events for GPIO 4: EIO"
        );
    }
}
