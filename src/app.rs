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

//! Run sequence
//!
//! Resolves the chip, opens it, wires Ctrl+C to the stop flag and runs the
//! selected driver with stdout as the output.

use std::io;

use anyhow::Context;
use gfr_core::{
    auto_detect_chip, run_single, run_watch, CdevProvider, Result, RunOptions, RunSettings,
    RunSummary, StopFlag,
};
use tracing::{debug, info, warn};

/// Chip named on the command line, otherwise the one owning the first line
pub fn resolve_chip(settings: &RunSettings) -> Result<String> {
    match &settings.chip {
        Some(chip) => Ok(chip.clone()),
        None => {
            let first = settings.lines.first().copied().unwrap_or_default();
            auto_detect_chip(first)
        }
    }
}

/// Route SIGINT, SIGTERM and SIGHUP to the stop flag
pub fn install_interrupt_handler(stop: &StopFlag) {
    let stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("interrupt received, stopping");
        stop.set();
    }) {
        warn!("Failed to set signal handler: {}. Ctrl+C will terminate immediately.", e);
    }
}

/// Measure according to validated settings
pub fn run(settings: RunSettings) -> anyhow::Result<RunSummary> {
    let chip = resolve_chip(&settings).context("cannot auto-detect GPIO chip")?;
    let provider = CdevProvider::new(&chip).with_context(|| format!("cannot use {}", chip))?;
    debug!(
        "Using {} for GPIO {:?}: duration {} s, warmup {} s, {} pulses/rev, {} edges",
        chip,
        settings.lines,
        settings.duration_secs,
        settings.warmup_secs,
        settings.pulses_per_rev,
        settings.edge
    );

    let stop = StopFlag::new();
    install_interrupt_handler(&stop);

    let watch = settings.watch;
    let plan = settings.into_plan(&chip);
    let options = RunOptions::default();
    let mut out = io::stdout().lock();

    let summary = if watch {
        eprintln!("\nWatch mode started. Press 'q' to quit or Ctrl+C to interrupt.\n");
        run_watch(&plan, &provider, &stop, &mut out, &options)?
    } else {
        run_single(&plan, &provider, &stop, &mut out, &options)?
    };

    if !summary.is_clean() {
        warn!("could not measure GPIO {:?}", summary.failed_lines);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_chip_skips_detection() {
        let settings = RunSettings {
            lines: vec![17],
            chip: Some("gpiochip4".into()),
            ..RunSettings::default()
        };
        assert_eq!(resolve_chip(&settings).unwrap(), "gpiochip4");
    }
}
