//! Output formatting
//!
//! Turns one round of readings into the text written to stdout. A round is
//! always formatted as a whole so the driver can emit it with a single write.

use std::ffi::CStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::data::{OutputMode, Reading};
use crate::engine::RpmStats;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct JsonReading {
    gpio: u32,
    rpm: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg: Option<i64>,
}

impl From<&Reading> for JsonReading {
    fn from(reading: &Reading) -> Self {
        let stats = reading.stats.as_ref();
        Self {
            gpio: reading.line,
            rpm: reading.rpm.round() as i64,
            min: stats.map(|s| s.min().round() as i64),
            max: stats.map(|s| s.max().round() as i64),
            avg: stats.map(|s| s.average().round() as i64),
        }
    }
}

pub fn format_numeric(rpm: f64) -> String {
    format!("{:.0}\n", rpm)
}

pub fn format_human(line: u32, rpm: f64, stats: Option<&RpmStats>) -> String {
    match stats {
        Some(s) => format!(
            "GPIO{}: RPM: {:.0} (min: {:.0}, max: {:.0}, avg: {:.0})\n",
            line,
            rpm,
            s.min(),
            s.max(),
            s.average()
        ),
        None => format!("GPIO{}: RPM: {:.0}\n", line, rpm),
    }
}

pub fn format_json(reading: &Reading) -> Result<String> {
    let mut out = serde_json::to_string(&JsonReading::from(reading))?;
    out.push('\n');
    Ok(out)
}

/// All readings of a round as one JSON array on one line
pub fn format_json_array(readings: &[Reading]) -> Result<String> {
    let records: Vec<JsonReading> = readings.iter().map(JsonReading::from).collect();
    let mut out = serde_json::to_string(&records)?;
    out.push('\n');
    Ok(out)
}

pub fn format_collectd(host: &str, line: u32, rpm: f64, interval: u64, timestamp: u64) -> String {
    format!(
        "PUTVAL \"{}/gpio-fan-{}/gauge-rpm\" interval={} {}:{:.0}\n",
        host, line, interval, timestamp, rpm
    )
}

/// Host name for collectd identifiers, `unknown` if it cannot be read
pub fn hostname() -> String {
    let mut buf = [0 as libc::c_char; 256];
    // SAFETY: buf is writable for its full length minus the reserved NUL.
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len() - 1) };
    if ret != 0 {
        return "unknown".to_string();
    }
    // SAFETY: the last byte was never written and is still NUL.
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    match name.to_str() {
        Ok(s) if !s.is_empty() => s.to_string(),
        _ => "unknown".to_string(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Formats whole rounds for one output mode
#[derive(Debug, Clone)]
pub struct Formatter {
    mode: OutputMode,
    interval_secs: u64,
    /// Number of requested lines; JSON rounds are arrays when above one
    channels: usize,
    host: String,
}

impl Formatter {
    pub fn new(mode: OutputMode, interval_secs: u64, channels: usize) -> Self {
        let host = match mode {
            OutputMode::Collectd => hostname(),
            _ => String::new(),
        };
        Self {
            mode,
            interval_secs,
            channels,
            host,
        }
    }

    /// Override the collectd host name
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn format_round(&self, readings: &[Reading]) -> Result<String> {
        self.format_round_at(readings, unix_now())
    }

    /// Format a round with an explicit collectd timestamp
    pub fn format_round_at(&self, readings: &[Reading], timestamp: u64) -> Result<String> {
        if readings.is_empty() {
            return Ok(String::new());
        }
        if self.mode == OutputMode::Json && self.channels > 1 {
            return format_json_array(readings);
        }

        let mut out = String::new();
        for reading in readings {
            let text = match self.mode {
                OutputMode::Human => format_human(reading.line, reading.rpm, reading.stats.as_ref()),
                OutputMode::Numeric => format_numeric(reading.rpm),
                OutputMode::Json => format_json(reading)?,
                OutputMode::Collectd => format_collectd(
                    &self.host,
                    reading.line,
                    reading.rpm,
                    self.interval_secs,
                    timestamp,
                ),
            };
            out.push_str(&text);
        }
        Ok(out)
    }
}
