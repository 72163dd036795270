/*
 * Copyright 2006 Nikita Danilov <danilov@gmail.com>
 *
 * This file is part of repalg.
 *
 * repalg is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * repalg is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * repalg. If not, see <https://www.gnu.org/licenses/>.
 */

//! Thin binary entry point: one optional config-file argument, the trace on
//! standard input, a one-line summary on standard output.

use repalg::config::{Config, Verbose};
use repalg::Driver;
use std::io::{self, BufReader};
use std::process::ExitCode;

fn log_level(verbose: Verbose) -> log::LevelFilter {
	if verbose.contains(Verbose::TRACE) {
		log::LevelFilter::Trace
	} else if verbose.contains(Verbose::TABLE) {
		log::LevelFilter::Debug
	} else if verbose.contains(Verbose::LOG) || verbose.contains(Verbose::PROGRESS) {
		log::LevelFilter::Info
	} else {
		log::LevelFilter::Warn
	}
}

fn run() -> repalg::Result<()> {
	let config_path = std::env::args().nth(1).unwrap_or_else(|| "repalg.toml".to_string());
	let cfg = Config::from_file(&config_path)?;

	env_logger::Builder::new().filter_level(log_level(cfg.verbose)).init();

	let stdin = io::stdin();
	let mut driver = Driver::new(&cfg, BufReader::new(stdin.lock()));
	let summary = driver.run()?;

	println!("{} {} {:.2}", summary.hits, summary.misses, summary.hit_ratio_percent());
	Ok(())
}

fn main() -> ExitCode {
	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("repalg: {err}");
			ExitCode::from(err.exit_code() as u8)
		}
	}
}
