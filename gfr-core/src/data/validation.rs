//! Input validation for gpio-fan-rpm
//!
//! Range checks for every user-supplied value, applied the same way whether
//! the value came from the command line or from the environment.

use tracing::warn;

use crate::constants::limits;
use crate::error::{FanRpmError, Result};

/// Validates a GPIO line number (0-999)
pub fn validate_line(line: u32) -> Result<u32> {
    if line > limits::MAX_LINE {
        return Err(FanRpmError::invalid_config(
            "gpio",
            format!("GPIO pin {} is out of valid range (0-{})", line, limits::MAX_LINE),
        ));
    }
    Ok(line)
}

/// Validates the total measurement duration in seconds (1-3600)
pub fn validate_duration(secs: u32) -> Result<u32> {
    if secs < limits::MIN_DURATION_SECS {
        return Err(FanRpmError::invalid_config(
            "duration",
            format!("must be at least {} second", limits::MIN_DURATION_SECS),
        ));
    }
    if secs > limits::MAX_DURATION_SECS {
        return Err(FanRpmError::invalid_config(
            "duration",
            format!("must be at most {} seconds", limits::MAX_DURATION_SECS),
        ));
    }
    Ok(secs)
}

/// Validates the warmup duration in seconds (0-60)
pub fn validate_warmup(secs: u32) -> Result<u32> {
    if secs > limits::MAX_WARMUP_SECS {
        return Err(FanRpmError::invalid_config(
            "warmup",
            format!("must be between 0 and {} seconds", limits::MAX_WARMUP_SECS),
        ));
    }
    Ok(secs)
}

/// Validates pulses per revolution (1-100)
pub fn validate_pulses(pulses: u32) -> Result<u32> {
    if !(limits::MIN_PULSES..=limits::MAX_PULSES).contains(&pulses) {
        return Err(FanRpmError::invalid_config(
            "pulses",
            format!("must be between {} and {}", limits::MIN_PULSES, limits::MAX_PULSES),
        ));
    }
    Ok(pulses)
}

/// The counting phase must last at least one second after warmup
pub fn validate_window(duration: u32, warmup: u32) -> Result<()> {
    if duration < warmup + 1 {
        return Err(FanRpmError::invalid_config(
            "duration",
            format!(
                "duration ({}) must be at least warmup + 1 second ({}); try --duration={} or --warmup={}",
                duration,
                warmup + 1,
                warmup + 1,
                duration.saturating_sub(1)
            ),
        ));
    }
    Ok(())
}

/// Validates the channel list: non-empty, each line in range, no duplicates.
///
/// Lists longer than the channel limit are truncated with a warning.
pub fn validate_lines(lines: &[u32]) -> Result<Vec<u32>> {
    if lines.is_empty() {
        return Err(FanRpmError::NoLines);
    }

    let mut lines = lines.to_vec();
    if lines.len() > limits::MAX_CHANNELS {
        warn!(
            "Too many GPIOs ({}), limiting to {}",
            lines.len(),
            limits::MAX_CHANNELS
        );
        lines.truncate(limits::MAX_CHANNELS);
    }

    for (i, &line) in lines.iter().enumerate() {
        validate_line(line)?;
        if lines[i + 1..].contains(&line) {
            return Err(FanRpmError::DuplicateLine(line));
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_line() {
        assert!(validate_line(0).is_ok());
        assert!(validate_line(999).is_ok());
        assert!(validate_line(1000).is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(0).is_err());
        assert_eq!(validate_duration(1).unwrap(), 1);
        assert_eq!(validate_duration(3600).unwrap(), 3600);
        assert!(validate_duration(3601).is_err());
    }

    #[test]
    fn test_validate_warmup_and_pulses() {
        assert!(validate_warmup(0).is_ok());
        assert!(validate_warmup(60).is_ok());
        assert!(validate_warmup(61).is_err());
        assert!(validate_pulses(0).is_err());
        assert!(validate_pulses(1).is_ok());
        assert!(validate_pulses(100).is_ok());
        assert!(validate_pulses(101).is_err());
    }

    #[test]
    fn test_validate_window() {
        assert!(validate_window(2, 1).is_ok());
        assert!(validate_window(1, 0).is_ok());
        assert!(validate_window(1, 1).is_err());
        assert!(validate_window(3, 5).is_err());
    }

    #[test]
    fn test_validate_lines() {
        assert!(matches!(validate_lines(&[]), Err(FanRpmError::NoLines)));
        assert!(matches!(
            validate_lines(&[17, 18, 17]),
            Err(FanRpmError::DuplicateLine(17))
        ));
        assert_eq!(validate_lines(&[18, 17, 19]).unwrap(), vec![18, 17, 19]);
    }

    #[test]
    fn test_validate_lines_truncates() {
        let many: Vec<u32> = (0..12).collect();
        let kept = validate_lines(&many).unwrap();
        assert_eq!(kept.len(), limits::MAX_CHANNELS);
        assert_eq!(kept, (0..10).collect::<Vec<u32>>());
    }
}
