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

use clap::Parser;
use gfr_core::EnvDefaults;
use tracing::debug;

use gpio_fan_rpm::{app, cli::Cli, logger};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = EnvDefaults::from_env();

    logger::init_logging(cli.debug_enabled(&env));

    let settings = match cli.to_settings(&env).validate() {
        Ok(settings) => settings,
        Err(e) if e.is_config() => {
            eprintln!("Error: {}", e);
            eprintln!("Try 'gpio-fan-rpm --help' for more information.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    debug!("settings: {:?}", settings);

    let summary = app::run(settings)?;
    if !summary.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
