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

//! The replacement-policy engine: eleven algorithms behind one interface.
//!
//! Every policy reacts to accesses through the same six entry points; most of
//! them get `read`/`read_ahead`/`fault`/`write`/`punch` for free from the
//! default methods below and only supply `touch` (hit-path bookkeeping) and
//! `allocate` (miss-path victim selection and placement).

pub mod arc;
pub mod car;
pub mod fifo;
pub mod fifo2;
pub mod linux;
pub mod lru;
pub mod opt;
pub mod random;
pub mod sfifo;
pub mod twoq;
pub mod worst;

use crate::config::{Algorithm, Config};
use crate::entity::{FrameId, PageId};
use crate::error::Result;
use crate::mm::Mm;
use crate::trace::Access;

/// The subset of [`crate::trace::LookAhead`] that clairvoyant policies need,
/// expressed as a trait so the driver can hand it to a `Box<dyn Policy>`
/// without the policy layer becoming generic over the reader type.
pub trait Lookahead {
	fn peek(&mut self, cursor: usize) -> Result<Option<Access>>;
}

impl<R: std::io::BufRead> Lookahead for crate::trace::LookAhead<R> {
	fn peek(&mut self, cursor: usize) -> Result<Option<Access>> {
		crate::trace::LookAhead::peek(self, cursor)
	}
}

/// Everything a policy method needs: the memory model, a look-ahead handle,
/// and the absolute trace position of the access under way (OPT's future
/// queues are indexed by this turn number).
pub struct Context<'a> {
	pub mm: &'a mut Mm,
	pub look: &'a mut dyn Lookahead,
	pub turn: u64,
}

/// One replacement algorithm's bookkeeping and decision logic.
///
/// `touch` runs on a hit (resident page re-accessed); `allocate` runs on a
/// miss and must return a frame with the victim, if any, already evicted.
/// Both default to the common case; most policies override only `allocate`.
pub trait Policy {
	fn init(&mut self, _mm: &mut Mm) {}
	fn fini(&mut self, _mm: &mut Mm) {}

	/// Hit-path bookkeeping: reorder lists, set reference bits, etc.
	fn touch(&mut self, _cx: &mut Context, _page: PageId) {}

	/// Miss-path victim selection and list insertion. Must leave the returned
	/// frame free (not yet bound to `page`); the caller performs the bind.
	fn allocate(&mut self, cx: &mut Context, page: PageId) -> FrameId;

	fn read(&mut self, cx: &mut Context, page: PageId) -> Result<()> {
		generic_fault(self, cx, page)
	}

	fn read_ahead(&mut self, cx: &mut Context, page: PageId) -> Result<()> {
		generic_fault(self, cx, page)
	}

	fn fault(&mut self, cx: &mut Context, page: PageId) -> Result<()> {
		generic_fault(self, cx, page)
	}

	fn write(&mut self, cx: &mut Context, page: PageId) -> Result<()> {
		if cx.mm.entities.pages[page as usize].frame.is_none() {
			let frame = self.allocate(cx, page);
			cx.mm.place(page, frame);
		} else {
			self.touch(cx, page);
		}
		Ok(())
	}

	/// A page is being discarded (TRUNCATE). The default frees its frame, if
	/// resident, and otherwise does nothing; ghost-list policies override this
	/// to also drop the page's ghost-queue membership.
	fn punch(&mut self, cx: &mut Context, page: PageId) {
		if let Some(frame) = cx.mm.entities.pages[page as usize].frame {
			cx.mm.free_frame(frame);
		}
	}
}

fn generic_fault<P: Policy + ?Sized>(policy: &mut P, cx: &mut Context, page: PageId) -> Result<()> {
	if cx.mm.entities.pages[page as usize].frame.is_some() {
		policy.touch(cx, page);
	} else {
		let frame = policy.allocate(cx, page);
		cx.mm.place(page, frame);
		cx.mm.pagein(page);
	}
	Ok(())
}

/// Builds the policy selected by configuration, sized from the same config.
pub fn make_policy(cfg: &Config) -> Box<dyn Policy> {
	match cfg.algorithm {
		Algorithm::Random => Box::new(random::Random::new()),
		Algorithm::Lru => Box::new(lru::Lru::new()),
		Algorithm::Fifo => Box::new(fifo::Fifo::new()),
		Algorithm::Fifo2 => Box::new(fifo2::Fifo2::new()),
		Algorithm::Sfifo => Box::new(sfifo::Sfifo::new(cfg.sfifo.tail_percent)),
		Algorithm::TwoQ => Box::new(twoq::TwoQ::new(cfg.twoq.kin_percent, cfg.twoq.kout_percent)),
		Algorithm::Car => Box::new(car::Car::new()),
		Algorithm::Arc => Box::new(arc::Arc::new()),
		Algorithm::Linux => Box::new(linux::Linux::new()),
		Algorithm::Worst => Box::new(worst::Worst::new()),
		Algorithm::Opt => Box::new(opt::Opt::new()),
	}
}
