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

//! LRU: resident frames kept in most-recently-used order; the tail is always
//! the least-recently-used frame.

use super::{Context, Policy};
use crate::entity::{FrameId, FrameStore, PageId};
use crate::list::List;

pub struct Lru {
	resident: List,
}

impl Lru {
	pub fn new() -> Self {
		Lru { resident: List::new() }
	}
}

impl Policy for Lru {
	fn touch(&mut self, cx: &mut Context, page: PageId) {
		let frame = cx.mm.entities.pages[page as usize].frame.expect("touch on a resident page");
		let mut store = FrameStore(&mut cx.mm.entities.frames);
		self.resident.remove(&mut store, frame);
		self.resident.push_front(&mut store, frame);
	}

	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			let victim = self.resident.back().expect("resident list nonempty when no frame is free");
			self.resident.remove(&mut FrameStore(&mut cx.mm.entities.frames), victim);
			cx.mm.steal(victim);
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
	fn recently_touched_page_survives_eviction() {
		let mut mm = Mm::new(2, 3, 1);
		let mut look = NoLookahead;
		let mut policy = Lru::new();
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 1).unwrap();
			// Touch page 0 again so page 1 becomes the LRU victim.
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 2).unwrap();
		}
		assert!(mm.entities.pages[0].frame.is_some());
		assert!(mm.entities.pages[1].frame.is_none());
		assert!(mm.entities.pages[2].frame.is_some());
		mm.check_invariants();
	}
}
