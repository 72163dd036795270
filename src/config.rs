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

//! Configuration surface.
//!
//! Values are loaded from a TOML file, the same mechanism the rest of this
//! tool's ancestry uses for its own boot configuration. A full command-line
//! experience (subcommands, generated help) is out of scope; the binary's
//! argument handling stays to "one optional config file path."

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

bitflags::bitflags! {
	/// Diagnostic verbosity bits, matching the original tool's `-v` flag.
	///
	/// The `serde` feature on the `bitflags` crate gives this (de)serialization
	/// support automatically; no manual `Deserialize` impl is needed.
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
	pub struct Verbose: u32 {
		/// Log every pagein/pageout/placement event.
		const TRACE = 1 << 0;
		/// Dump OPT's future-access table at init.
		const TABLE = 1 << 1;
		/// Log every access as it is classified.
		const LOG = 1 << 2;
		/// Print a progress mark every 1000 accesses.
		const PROGRESS = 1 << 3;
	}
}

/// The replacement policy to run the trace under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
	Random,
	Lru,
	Fifo,
	Fifo2,
	Sfifo,
	#[serde(rename = "2q")]
	TwoQ,
	Car,
	Arc,
	Linux,
	Worst,
	Opt,
}

impl FromStr for Algorithm {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s {
			"random" => Algorithm::Random,
			"lru" => Algorithm::Lru,
			"fifo" => Algorithm::Fifo,
			"fifo2" => Algorithm::Fifo2,
			"sfifo" => Algorithm::Sfifo,
			"2q" => Algorithm::TwoQ,
			"car" => Algorithm::Car,
			"arc" => Algorithm::Arc,
			"linux" => Algorithm::Linux,
			"worst" => Algorithm::Worst,
			"opt" => Algorithm::Opt,
			other => return Err(Error::UnknownAlgorithm(other.to_string())),
		})
	}
}

/// SFIFO's head/tail segment tuning.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SfifoConfig {
	/// Desired tail-segment size, as a percentage of total frames. At 100 SFIFO
	/// degenerates to LRU; at 0 it degenerates to FIFO.
	pub tail_percent: u16,
}

impl Default for SfifoConfig {
	fn default() -> Self {
		SfifoConfig { tail_percent: 50 }
	}
}

/// 2Q's A1in/A1out size caps.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TwoQConfig {
	/// A1in cap, as a percentage of total frames.
	pub kin_percent: u16,
	/// A1out cap, as a percentage of total frames.
	pub kout_percent: u16,
}

impl Default for TwoQConfig {
	fn default() -> Self {
		TwoQConfig {
			kin_percent: 25,
			kout_percent: 50,
		}
	}
}

/// The full configuration surface for a single run.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
	pub algorithm: Algorithm,
	/// Number of physical frames in the primary store.
	pub frames: u64,
	/// Number of virtual pages in the virtual-page universe.
	pub vpages: u64,
	/// Number of file objects.
	pub objects: u64,
	/// Numeric base used when parsing non-trace numeric overrides (0 = auto,
	/// following `strtoull`'s convention of sniffing a `0x`/`0` prefix).
	pub radix: u32,
	pub sfifo: SfifoConfig,
	#[serde(rename = "twoq")]
	pub twoq: TwoQConfig,
	pub verbose: Verbose,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			algorithm: Algorithm::Lru,
			frames: 256,
			vpages: 4096,
			objects: 16,
			radix: 0,
			sfifo: SfifoConfig::default(),
			twoq: TwoQConfig::default(),
			verbose: Verbose::empty(),
		}
	}
}

impl Config {
	/// Loads a configuration from a TOML file, falling back to all-defaults
	/// fields for anything the file omits.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
		let text = fs::read_to_string(path)?;
		Ok(toml::from_str(&text)?)
	}

	/// Parses an integer honoring the configured radix, the same convention
	/// `strtoull(optarg, &eoc, radix)` used for the original tool's `-M`/`-V`/
	/// `-f`/`-t`/`-k`/`-K` flags. Never used for the trace's own hex fields,
	/// which are always hex regardless of this setting.
	pub fn parse_numeric(&self, name: &str, value: &str) -> Result<u64> {
		let bad = || Error::BadOption {
			name: name.to_string(),
			value: value.to_string(),
		};
		let (digits, radix) = match self.radix {
			0 => {
				if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
					(hex, 16)
				} else if value.len() > 1 && value.starts_with('0') {
					(&value[1..], 8)
				} else {
					(value, 10)
				}
			}
			r => (value, r),
		};
		u64::from_str_radix(digits, radix).map_err(|_| bad())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_pick_lru() {
		let cfg = Config::default();
		assert_eq!(cfg.algorithm, Algorithm::Lru);
		assert_eq!(cfg.sfifo.tail_percent, 50);
	}

	#[test]
	fn algorithm_from_str_rejects_unknown_names() {
		assert!(matches!(
			"bogus".parse::<Algorithm>(),
			Err(Error::UnknownAlgorithm(_))
		));
		assert_eq!("2q".parse::<Algorithm>().unwrap(), Algorithm::TwoQ);
	}

	#[test]
	fn parse_numeric_auto_radix_sniffs_prefix() {
		let cfg = Config::default();
		assert_eq!(cfg.parse_numeric("frames", "0x10").unwrap(), 16);
		assert_eq!(cfg.parse_numeric("frames", "010").unwrap(), 8);
		assert_eq!(cfg.parse_numeric("frames", "10").unwrap(), 10);
	}

	#[test]
	fn parse_numeric_fixed_radix_ignores_prefix_sniffing() {
		let mut cfg = Config::default();
		cfg.radix = 16;
		assert_eq!(cfg.parse_numeric("frames", "10").unwrap(), 16);
	}

	#[test]
	fn loads_from_toml_text() {
		let text = "algorithm = \"sfifo\"\nframes = 64\n\n[sfifo]\ntail_percent = 30\n";
		let dir = std::env::temp_dir().join("repalg-config-test.toml");
		std::fs::write(&dir, text).unwrap();
		let cfg = Config::from_file(&dir).unwrap();
		assert_eq!(cfg.algorithm, Algorithm::Sfifo);
		assert_eq!(cfg.frames, 64);
		assert_eq!(cfg.sfifo.tail_percent, 30);
		std::fs::remove_file(&dir).unwrap();
	}
}
