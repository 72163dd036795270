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

//! 2Q: a long-term LRU list (`Am`), a short-term FIFO of fresh arrivals
//! (`A1in`), and a ghost list of recently evicted identities (`A1out`) that
//! lets a page "prove itself" before earning a spot in `Am`.

use super::{Context, Policy};
use crate::entity::{FrameId, FrameStore, PageId, PolicyPageStore};
use crate::list::List;

pub struct TwoQ {
	am: List,
	a1in: List,
	a1out: List,
	/// Per-frame: resident in `a1in` (true) or `am` (false).
	in_a1in: Vec<bool>,
	/// Per-page: currently listed in the `a1out` ghost list.
	in_ghost: Vec<bool>,
	kin_percent: u16,
	kout_percent: u16,
}

impl TwoQ {
	pub fn new(kin_percent: u16, kout_percent: u16) -> Self {
		TwoQ {
			am: List::new(),
			a1in: List::new(),
			a1out: List::new(),
			in_a1in: Vec::new(),
			in_ghost: Vec::new(),
			kin_percent,
			kout_percent,
		}
	}

	fn push_ghost(&mut self, cx: &mut Context, page: PageId) {
		let kout_cap = cx.mm.nr_frames * self.kout_percent as u64 / 100;
		if self.a1out.len() >= kout_cap {
			if let Some(oldest) = self.a1out.back() {
				self.in_ghost[oldest as usize] = false;
				self.a1out.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), oldest);
			}
		}
		self.in_ghost[page as usize] = true;
		self.a1out.push_front(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
	}

	fn reclaim(&mut self, cx: &mut Context) {
		let kin_cap = cx.mm.nr_frames * self.kin_percent as u64 / 100;
		if self.a1in.len() > kin_cap {
			let victim = self.a1in.back().expect("a1in nonempty when over its cap");
			let page = cx.mm.entities.frames[victim as usize].page.expect("resident frame has a page");
			self.a1in.remove(&mut FrameStore(&mut cx.mm.entities.frames), victim);
			self.push_ghost(cx, page);
			cx.mm.steal(victim);
		} else {
			let victim = self.am.back().expect("am nonempty when no frame is free");
			self.am.remove(&mut FrameStore(&mut cx.mm.entities.frames), victim);
			cx.mm.steal(victim);
		}
	}
}

impl Policy for TwoQ {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.in_a1in = vec![false; mm.nr_frames as usize];
		self.in_ghost = vec![false; mm.nr_vpages as usize];
	}

	fn touch(&mut self, cx: &mut Context, page: PageId) {
		let frame = cx.mm.entities.pages[page as usize].frame.expect("touch on a resident page");
		if !self.in_a1in[frame as usize] {
			let mut store = FrameStore(&mut cx.mm.entities.frames);
			self.am.remove(&mut store, frame);
			self.am.push_front(&mut store, frame);
		}
		// A hit in A1in leaves its FIFO order untouched.
	}

	fn allocate(&mut self, cx: &mut Context, page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			self.reclaim(cx);
		}
		let frame = cx.mm.alloc_free_frame();
		if self.in_ghost[page as usize] {
			self.in_ghost[page as usize] = false;
			self.a1out.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
			self.am.push_front(&mut FrameStore(&mut cx.mm.entities.frames), frame);
			self.in_a1in[frame as usize] = false;
		} else {
			self.a1in.push_front(&mut FrameStore(&mut cx.mm.entities.frames), frame);
			self.in_a1in[frame as usize] = true;
		}
		frame
	}

	fn punch(&mut self, cx: &mut Context, page: PageId) {
		if let Some(frame) = cx.mm.entities.pages[page as usize].frame {
			{
				let mut store = FrameStore(&mut cx.mm.entities.frames);
				if self.in_a1in[frame as usize] {
					self.a1in.remove(&mut store, frame);
				} else {
					self.am.remove(&mut store, frame);
				}
			}
			cx.mm.free_frame(frame);
		} else if self.in_ghost[page as usize] {
			self.in_ghost[page as usize] = false;
			self.a1out.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mm::Mm;
	use crate::policy::Lookahead;
	use crate::trace::Access;

	struct NoLookahead;
	impl Lookahead for NoLookahead {
		fn peek(&mut self, _cursor: usize) -> crate::error::Result<Option<Access>> {
			Ok(None)
		}
	}

	#[test]
	fn a_page_found_in_the_ghost_list_is_promoted_straight_into_am() {
		let mut mm = Mm::new(2, 2, 1);
		let mut look = NoLookahead;
		let mut policy = TwoQ::new(50, 50);
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			// Seed the ghost list the way `reclaim` would after evicting page 0
			// from a1in, then replay its next access as a miss.
			policy.push_ghost(&mut cx, 0);
			policy.read(&mut cx, 0).unwrap();
		}
		assert!(!policy.in_ghost[0]);
		let frame = mm.entities.pages[0].frame.expect("page 0 resident");
		assert!(!policy.in_a1in[frame as usize]);
		mm.check_invariants();
	}
}
