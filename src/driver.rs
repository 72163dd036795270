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

//! The driver loop: pulls accesses, validates and binds identities, classifies
//! hit/miss, dispatches to the active policy, and accumulates the run's
//! counters.

use crate::config::Config;
use crate::entity::{FrameFlags, ObjectId, ObjectPageStore, PageId};
use crate::error::{Error, Result};
use crate::mm::Mm;
use crate::policy::{make_policy, Context, Policy};
use crate::trace::{Access, AccessType, LookAhead};
use std::io::BufRead;

/// Final tally reported at end of trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
	pub hits: u64,
	pub misses: u64,
	pub total: u64,
}

impl Summary {
	/// Hit ratio over fault-capable accesses only; WRITE and TRUNCATE never
	/// count toward either side.
	pub fn hit_ratio_percent(&self) -> f64 {
		let faulting = self.hits + self.misses;
		if faulting == 0 {
			0.0
		} else {
			self.hits as f64 * 100.0 / faulting as f64
		}
	}
}

/// Drives one replay of a trace under one policy.
pub struct Driver<R> {
	mm: Mm,
	policy: Box<dyn Policy>,
	trace: LookAhead<R>,
	turn: u64,
}

impl<R: BufRead> Driver<R> {
	pub fn new(cfg: &Config, trace: R) -> Self {
		let mut mm = Mm::new(cfg.frames, cfg.vpages, cfg.objects);
		let mut policy = make_policy(cfg);
		policy.init(&mut mm);
		Driver {
			mm,
			policy,
			trace: LookAhead::new(trace),
			turn: 0,
		}
	}

	/// Exposes the final memory-model state for inspection after `run`.
	pub fn mm(&self) -> &Mm {
		&self.mm
	}

	/// Replays the whole trace and returns the final counters.
	pub fn run(&mut self) -> Result<Summary> {
		log::info!("starting replay");
		while let Some(access) = self.trace.next_access()? {
			self.step(access)?;
		}
		self.policy.fini(&mut self.mm);
		log::info!(
			"replay done: {} hits, {} misses, {} total",
			self.mm.hits,
			self.mm.misses,
			self.mm.total
		);
		Ok(Summary {
			hits: self.mm.hits,
			misses: self.mm.misses,
			total: self.mm.total,
		})
	}

	fn step(&mut self, access: Access) -> Result<()> {
		if access.page >= self.mm.nr_vpages {
			return Err(Error::PageOutOfRange {
				page: access.page,
				limit: self.mm.nr_vpages,
			});
		}
		if access.object >= self.mm.nr_objects {
			return Err(Error::ObjectOutOfRange {
				object: access.object,
				limit: self.mm.nr_objects,
			});
		}
		let page = access.page as PageId;
		let object = access.object as ObjectId;

		// TRUNCATE's leading field shares the trace's page column but never
		// names a page identity of its own; only the object and the cutoff
		// index matter, so binding it would spuriously clash with whatever
		// index page 0 was first seen at.
		if access.ty != AccessType::Truncate {
			self.mm.bind_object(page, object, access.index)?;
		}

		let was_resident = self.mm.entities.pages[page as usize].frame.is_some();
		if access.ty.may_fault() {
			if was_resident {
				self.mm.hits += 1;
			} else {
				self.mm.misses += 1;
			}
		}
		self.mm.total += 1;
		let classification = if !access.ty.may_fault() {
			"n/a"
		} else if was_resident {
			"hit"
		} else {
			"miss"
		};
		log::trace!("turn {}: {:?} page {page:#x} ({classification})", self.turn, access.ty);

		let turn = self.turn;
		self.turn += 1;

		match access.ty {
			AccessType::Read => {
				let mut cx = Context { mm: &mut self.mm, look: &mut self.trace, turn };
				self.policy.read(&mut cx, page)?;
			}
			AccessType::ReadAhead => {
				let mut cx = Context { mm: &mut self.mm, look: &mut self.trace, turn };
				self.policy.read_ahead(&mut cx, page)?;
			}
			AccessType::PageFault => {
				let mut cx = Context { mm: &mut self.mm, look: &mut self.trace, turn };
				self.policy.fault(&mut cx, page)?;
			}
			AccessType::Write => {
				{
					let mut cx = Context { mm: &mut self.mm, look: &mut self.trace, turn };
					self.policy.write(&mut cx, page)?;
				}
				if let Some(frame) = self.mm.entities.pages[page as usize].frame {
					self.mm.entities.frames[frame as usize].flags.insert(FrameFlags::DIRTY);
				}
			}
			AccessType::Truncate => {
				let threshold = access.index;
				let ids: Vec<PageId> = {
					let store = ObjectPageStore(&mut self.mm.entities.pages);
					self.mm.entities.objects[object as usize].pages.iter(&store).collect()
				};
				let targets: Vec<PageId> = ids
					.into_iter()
					.filter(|&pid| self.mm.entities.pages[pid as usize].index >= threshold)
					.collect();
				let mut cx = Context { mm: &mut self.mm, look: &mut self.trace, turn };
				for pid in targets {
					self.policy.punch(&mut cx, pid);
				}
			}
		}

		if access.ty != AccessType::Truncate {
			if let Some(frame) = self.mm.entities.pages[page as usize].frame {
				self.mm.entities.frames[frame as usize].flags.insert(FrameFlags::REF);
			}
		}

		if self.turn % 1000 == 0 {
			log::info!("progress: {} accesses replayed", self.turn);
		}

		self.mm.check_invariants();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{Algorithm, Config, TwoQConfig};

	fn cfg(algorithm: Algorithm, frames: u64, vpages: u64) -> Config {
		Config {
			algorithm,
			frames,
			vpages,
			objects: 1,
			..Config::default()
		}
	}

	fn run(cfg: &Config, trace: &str) -> Summary {
		Driver::new(cfg, trace.as_bytes()).run().unwrap()
	}

	#[test]
	fn lru_basic_hit_and_miss() {
		let c = cfg(Algorithm::Lru, 2, 3);
		let s = run(&c, "0 0 0 R\n1 0 1 R\n0 0 0 R\n2 0 2 R\n1 0 1 R\n");
		assert_eq!(s.hits, 1);
		assert_eq!(s.misses, 4);
	}

	#[test]
	fn opt_beats_lru_on_the_same_trace() {
		let trace = "0 0 0 R\n1 0 1 R\n2 0 2 R\n3 0 3 R\n0 0 0 R\n1 0 1 R\n2 0 2 R\n3 0 3 R\n0 0 0 R\n";
		let lru = run(&cfg(Algorithm::Lru, 3, 4), trace);
		assert_eq!(lru.misses, 9);
		let opt = run(&cfg(Algorithm::Opt, 3, 4), trace);
		assert_eq!(opt.misses, 4);
	}

	#[test]
	fn fifo_vs_fifo2_total_misses_match_with_different_eviction_order() {
		let trace = "0 0 0 R\n1 0 1 R\n2 0 2 R\n0 0 0 R\n3 0 3 R\n0 0 0 R\n";
		let fifo = run(&cfg(Algorithm::Fifo, 3, 4), trace);
		assert_eq!(fifo.misses, 4);
		let fifo2 = run(&cfg(Algorithm::Fifo2, 3, 4), trace);
		assert_eq!(fifo2.misses, 4);
	}

	#[test]
	fn write_then_read_installs_without_a_fault_and_leaves_the_frame_dirty() {
		let c = cfg(Algorithm::Lru, 1, 1);
		let mut driver = Driver::new(&c, "0 0 0 W\n0 0 0 R\n".as_bytes());
		let s = driver.run().unwrap();
		assert_eq!(s.misses, 0);
		assert_eq!(s.hits, 1);
		let frame = driver.mm().entities.pages[0].frame.expect("page 0 resident");
		assert!(driver.mm().entities.frames[frame as usize].flags.contains(FrameFlags::DIRTY));
	}

	#[test]
	fn truncate_frees_pages_at_or_past_the_cutoff_index() {
		let c = cfg(Algorithm::Lru, 4, 3);
		let s = run(&c, "0 0 0 R\n1 0 1 R\n2 0 2 R\n0 0 5 T\n1 0 1 R\n");
		// No page in object 0 has index >= 5, so nothing is actually evicted;
		// the subsequent re-read of page 1 is a hit.
		assert_eq!(s.hits, 1);
		assert_eq!(s.misses, 3);
	}

	#[test]
	fn truncate_applied_twice_at_the_same_index_is_idempotent() {
		let c = cfg(Algorithm::Lru, 4, 3);
		let first = run(&c, "0 0 0 R\n1 0 1 R\n2 0 2 R\n0 0 1 T\n");
		let second = run(&c, "0 0 0 R\n1 0 1 R\n2 0 2 R\n0 0 1 T\n0 0 1 T\n");
		assert_eq!(first.hits, second.hits);
		assert_eq!(first.misses, second.misses);
	}

	#[test]
	fn two_q_ghost_hit_is_promoted_into_am_not_a1in() {
		let mut c = cfg(Algorithm::TwoQ, 2, 3);
		c.twoq = TwoQConfig { kin_percent: 50, kout_percent: 100 };
		let s = run(&c, "0 0 0 R\n1 0 1 R\n2 0 2 R\n0 0 0 R\n");
		assert_eq!(s.hits, 0);
		assert_eq!(s.misses, 4);
	}

	#[test]
	fn sfifo_degenerates_to_fifo_and_lru_at_the_percentage_extremes() {
		let trace = "0 0 0 R\n1 0 1 R\n0 0 0 R\n2 0 2 R\n";
		let mut fifo_like = cfg(Algorithm::Sfifo, 2, 3);
		fifo_like.sfifo.tail_percent = 0;
		let mut lru_like = cfg(Algorithm::Sfifo, 2, 3);
		lru_like.sfifo.tail_percent = 100;
		let sfifo_as_fifo = run(&fifo_like, trace);
		let fifo = run(&cfg(Algorithm::Fifo, 2, 3), trace);
		assert_eq!(sfifo_as_fifo.misses, fifo.misses);
		let sfifo_as_lru = run(&lru_like, trace);
		let lru = run(&cfg(Algorithm::Lru, 2, 3), trace);
		assert_eq!(sfifo_as_lru.misses, lru.misses);
	}

	#[test]
	fn out_of_range_page_is_rejected() {
		let c = cfg(Algorithm::Lru, 1, 1);
		let err = Driver::new(&c, "5 0 0 R\n".as_bytes()).run().unwrap_err();
		assert!(matches!(err, Error::PageOutOfRange { .. }));
	}

	#[test]
	fn identity_contradiction_is_rejected() {
		let c = cfg(Algorithm::Lru, 2, 1);
		let err = Driver::new(&c, "0 0 0 R\n0 0 1 R\n".as_bytes()).run().unwrap_err();
		assert!(matches!(err, Error::IndexMismatch { .. }));
	}
}
