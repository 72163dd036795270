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

//! The single error type shared by every layer of the simulator.
//!
//! The driver never recovers from an error: a batch replay tool's only correct
//! response to corrupt input or a broken invariant is to stop and report, so this
//! module exists to give every failure mode a name rather than to support retries.

use thiserror::Error;

/// Every way a run of the simulator can fail short of a clean end-of-trace.
#[derive(Debug, Error)]
pub enum Error {
	/// The configured algorithm name does not match any known policy.
	#[error("unknown algorithm `{0}`")]
	UnknownAlgorithm(String),

	/// A numeric configuration value could not be parsed under the configured radix.
	#[error("malformed numeric option `{name}`: `{value}`")]
	BadOption {
		/// Name of the offending option.
		name: String,
		/// The raw text that failed to parse.
		value: String,
	},

	/// A trace line did not match `page object index type`.
	#[error("malformed trace line: `{0}`")]
	TraceParse(String),

	/// An access named a page or object type character this tool does not know.
	#[error("invalid access type `{0}`")]
	UnknownAccessType(char),

	/// A page number fell outside the configured virtual-page universe.
	#[error("page number {page:#x} out of range (>= {limit:#x})")]
	PageOutOfRange {
		/// The offending page number.
		page: u64,
		/// The configured number of virtual pages.
		limit: u64,
	},

	/// An object number fell outside the configured object universe.
	#[error("object number {object:#x} out of range (>= {limit:#x})")]
	ObjectOutOfRange {
		/// The offending object number.
		object: u64,
		/// The configured number of objects.
		limit: u64,
	},

	/// A page was seen bound to two different objects.
	#[error("page {page:#x} bound to object {first:#x}, now seen under object {second:#x}")]
	ObjectMismatch {
		/// The page in question.
		page: u64,
		/// The object it was first seen under.
		first: u64,
		/// The object the current access claims.
		second: u64,
	},

	/// A page was seen at two different offsets within the same object.
	#[error("page {page:#x} bound to index {first:#x}, now seen at index {second:#x}")]
	IndexMismatch {
		/// The page in question.
		page: u64,
		/// The index it was first seen at.
		first: u64,
		/// The index the current access claims.
		second: u64,
	},

	/// Setup or look-ahead ran out of memory.
	#[error("allocation failure: {0}")]
	Alloc(String),

	/// Underlying I/O on the trace stream or configuration file failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// The configuration file could not be parsed.
	#[error(transparent)]
	Config(#[from] toml::de::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Maps an error to the process exit code the binary reports, per the error
	/// handling design: configuration, parse, range, identity, and allocation
	/// failures each get their own nonzero status.
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::UnknownAlgorithm(_) | Error::BadOption { .. } | Error::Config(_) => 1,
			Error::TraceParse(_) | Error::UnknownAccessType(_) => 2,
			Error::PageOutOfRange { .. } | Error::ObjectOutOfRange { .. } => 3,
			Error::ObjectMismatch { .. } | Error::IndexMismatch { .. } => 4,
			Error::Alloc(_) => 5,
			Error::Io(_) => 6,
		}
	}
}
