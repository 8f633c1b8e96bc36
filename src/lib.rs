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

//! gpio-fan-rpm - fan speed measurement on Linux GPIO lines
//!
//! Front end around `gfr_core`: command-line parsing, logging setup and the
//! run sequence that resolves the chip, installs the interrupt handler and
//! hands off to the watch or single-shot driver.

pub mod app;
pub mod cli;
pub mod logger;
