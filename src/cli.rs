/*
 * This file is part of gpio-fan-rpm.
 *
 * Copyright (C) 2025 gpio-fan-rpm contributors
 *
 * gpio-fan-rpm is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Lesser General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * gpio-fan-rpm is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public License
 * along with gpio-fan-rpm. If not, see <https://www.gnu.org/licenses/>.
 */

//! Command Line Interface
//!
//! Flags map one to one onto `RunSettings`; anything not given on the
//! command line falls back to the environment defaults. Of the output
//! format flags the last one given wins.

use clap::Parser;
use gfr_core::{EdgeMode, EnvDefaults, OutputMode, RunSettings};

#[derive(Parser, Debug)]
#[command(name = "gpio-fan-rpm")]
#[command(version, disable_version_flag = true)]
#[command(about = "Measure fan RPM by counting GPIO edge events")]
#[command(long_about = "Measure fan RPM by counting GPIO edge events

Each requested line is measured on its own thread. In watch mode the
measurement repeats until 'q' is pressed or Ctrl+C is received, and every
round prints all lines in the order they were given.

EXAMPLES:
    gpio-fan-rpm -g 17                     Measure GPIO17 once
    gpio-fan-rpm -g 17 -g 18 --watch       Watch two fans
    gpio-fan-rpm -g 17 -d 5 --warmup 2     5 s window, first 2 s discarded
    gpio-fan-rpm -g 17 -e rising -p 2      Count rising edges only
    gpio-fan-rpm -g 17 -g 18 --json        One JSON array for both fans

ENVIRONMENT VARIABLES:
    GPIO_FAN_RPM_DURATION  Default for --duration
    GPIO_FAN_RPM_PULSES    Default for --pulses
    GPIO_FAN_RPM_WARMUP    Default for --warmup
    DEBUG=1                Same as --debug
    RUST_LOG=<filter>      Overrides the log filter")]
pub struct Cli {
    /// GPIO line to measure (repeat for more fans, up to 10)
    #[arg(short = 'g', long = "gpio", value_name = "N", required = true)]
    pub gpio: Vec<u32>,

    /// GPIO chip name, e.g. gpiochip0 (auto-detected if omitted)
    #[arg(short, long, value_name = "NAME")]
    pub chip: Option<String>,

    /// Total measurement window in seconds, warmup included (1-3600) [default: 2]
    #[arg(short, long, value_name = "SEC")]
    pub duration: Option<u32>,

    /// Pulses per revolution (1-100) [default: 4]
    #[arg(short, long, value_name = "N")]
    pub pulses: Option<u32>,

    /// Seconds discarded before counting starts (0-60) [default: 1]
    #[arg(long, value_name = "SEC")]
    pub warmup: Option<u32>,

    /// Edges to count: rising, falling or both
    #[arg(short, long, value_name = "TYPE", default_value = "both")]
    pub edge: EdgeMode,

    /// Measure continuously until 'q' or Ctrl+C
    #[arg(short, long)]
    pub watch: bool,

    /// Print only the RPM value
    #[arg(short, long, overrides_with_all = ["json", "collectd"])]
    pub numeric: bool,

    /// Print JSON
    #[arg(short, long, overrides_with_all = ["numeric", "collectd"])]
    pub json: bool,

    /// Print collectd PUTVAL lines
    #[arg(long, overrides_with_all = ["numeric", "json"])]
    pub collectd: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.numeric {
            OutputMode::Numeric
        } else if self.json {
            OutputMode::Json
        } else if self.collectd {
            OutputMode::Collectd
        } else {
            OutputMode::Human
        }
    }

    /// Debug logging requested by flag or environment
    pub fn debug_enabled(&self, env: &EnvDefaults) -> bool {
        self.debug || env.debug
    }

    /// Merge with environment defaults; the result is not validated yet
    pub fn to_settings(&self, env: &EnvDefaults) -> RunSettings {
        RunSettings {
            lines: self.gpio.clone(),
            chip: self.chip.clone(),
            duration_secs: self.duration.unwrap_or(env.duration),
            warmup_secs: self.warmup.unwrap_or(env.warmup),
            pulses_per_rev: self.pulses.unwrap_or(env.pulses),
            edge: self.edge,
            output: self.output_mode(),
            watch: self.watch,
            debug: self.debug_enabled(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_mode_default_human() {
        let cli = Cli::try_parse_from(["gpio-fan-rpm", "-g", "17"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Human);
        assert_eq!(cli.edge, EdgeMode::Both);
    }
}
