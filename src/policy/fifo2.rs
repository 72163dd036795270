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

//! FIFO2 (second-chance): a frame's `REF` bit, maintained by the driver, gives
//! it one extra trip through the list before eviction.

use super::{Context, Policy};
use crate::entity::{FrameFlags, FrameId, FrameStore, PageId};
use crate::list::List;

pub struct Fifo2 {
	resident: List,
}

impl Fifo2 {
	pub fn new() -> Self {
		Fifo2 { resident: List::new() }
	}
}

impl Policy for Fifo2 {
	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		loop {
			if cx.mm.free_count > 0 {
				break;
			}
			let victim = self.resident.back().expect("resident list nonempty when no frame is free");
			let referenced = cx.mm.entities.frames[victim as usize].flags.contains(FrameFlags::REF);
			if referenced {
				cx.mm.entities.frames[victim as usize].flags.remove(FrameFlags::REF);
				let mut store = FrameStore(&mut cx.mm.entities.frames);
				self.resident.remove(&mut store, victim);
				self.resident.push_front(&mut store, victim);
			} else {
				self.resident.remove(&mut FrameStore(&mut cx.mm.entities.frames), victim);
				cx.mm.steal(victim);
			}
		}
		let frame = cx.mm.alloc_free_frame();
		self.resident.push_front(&mut FrameStore(&mut cx.mm.entities.frames), frame);
		frame
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
	fn referenced_tail_gets_a_second_chance() {
		let mut mm = Mm::new(2, 3, 1);
		let mut look = NoLookahead;
		let mut policy = Fifo2::new();
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 1).unwrap();
			// The driver sets REF on every resulting resident frame; simulate
			// that here as it would after the first two accesses.
			let f0 = cx.mm.entities.pages[0].frame.unwrap();
			cx.mm.entities.frames[f0 as usize].flags.insert(FrameFlags::REF);
			policy.read(&mut cx, 2).unwrap();
		}
		// Page 0's frame got a second chance and should survive; page 1 (tail,
		// unreferenced) is evicted instead.
		assert!(mm.entities.pages[0].frame.is_some());
		assert!(mm.entities.pages[1].frame.is_none());
		assert!(mm.entities.pages[2].frame.is_some());
		mm.check_invariants();
	}
}
