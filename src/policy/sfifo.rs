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

//! SFIFO: a head segment (plain FIFO) and a tail segment, target-sized as a
//! percentage of total frames. Degenerates to FIFO at `tail_percent == 0` and
//! to LRU at `tail_percent == 100`.

use super::{Context, Policy};
use crate::entity::{FrameId, FrameStore, PageId};
use crate::list::List;

pub struct Sfifo {
	head: List,
	tail: List,
	/// Whether frame `i` currently sits in the tail segment. Kept here rather
	/// than in `FrameFlags` since its meaning is SFIFO-specific.
	in_tail: Vec<bool>,
	tail_percent: u16,
}

impl Sfifo {
	pub fn new(tail_percent: u16) -> Self {
		Sfifo {
			head: List::new(),
			tail: List::new(),
			in_tail: Vec::new(),
			tail_percent,
		}
	}

	fn tail_target(&self, nr_frames: u64) -> u64 {
		nr_frames * self.tail_percent as u64 / 100
	}

	fn migrate_and_evict(&mut self, cx: &mut Context) {
		let target = self.tail_target(cx.mm.nr_frames);
		while self.tail.len() < target {
			let Some(candidate) = self.head.back() else { break };
			self.in_tail[candidate as usize] = true;
			let mut store = FrameStore(&mut cx.mm.entities.frames);
			self.tail.move_front(&mut store, &mut self.head, candidate);
		}
		let victim = self
			.tail
			.back()
			.or_else(|| self.head.back())
			.expect("some frame resident when none is free");
		let was_tail = self.in_tail[victim as usize];
		self.in_tail[victim as usize] = false;
		let mut store = FrameStore(&mut cx.mm.entities.frames);
		if was_tail {
			self.tail.remove(&mut store, victim);
		} else {
			self.head.remove(&mut store, victim);
		}
		cx.mm.steal(victim);
	}
}

impl Policy for Sfifo {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.in_tail = vec![false; mm.nr_frames as usize];
	}

	fn touch(&mut self, cx: &mut Context, page: PageId) {
		let frame = cx.mm.entities.pages[page as usize].frame.expect("touch on a resident page");
		if self.in_tail[frame as usize] {
			self.in_tail[frame as usize] = false;
			let mut store = FrameStore(&mut cx.mm.entities.frames);
			self.head.move_front(&mut store, &mut self.tail, frame);
		}
		// A hit in the head segment does not reorder it.
	}

	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			self.migrate_and_evict(cx);
		}
		let frame = cx.mm.alloc_free_frame();
		self.head.push_front(&mut FrameStore(&mut cx.mm.entities.frames), frame);
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
	fn zero_percent_tail_degenerates_to_fifo() {
		let mut mm = Mm::new(2, 3, 1);
		let mut look = NoLookahead;
		let mut policy = Sfifo::new(0);
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 1).unwrap();
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 2).unwrap();
		}
		assert!(mm.entities.pages[0].frame.is_none());
		assert!(mm.entities.pages[1].frame.is_some());
		mm.check_invariants();
	}

	#[test]
	fn hit_in_tail_segment_protects_a_page_from_the_next_scan() {
		let mut mm = Mm::new(2, 4, 1);
		let mut look = NoLookahead;
		let mut policy = Sfifo::new(100);
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 1).unwrap();
			// Forces a scan: both resident frames migrate into the tail
			// segment and page 0 (the older of the two) is evicted.
			policy.read(&mut cx, 2).unwrap();
			// A hit on page 1, now sitting in the tail segment, promotes it
			// back to the head segment and protects it from the next scan.
			policy.read(&mut cx, 1).unwrap();
			policy.read(&mut cx, 3).unwrap();
		}
		assert!(mm.entities.pages[0].frame.is_none());
		assert!(mm.entities.pages[1].frame.is_some());
		assert!(mm.entities.pages[2].frame.is_none());
		assert!(mm.entities.pages[3].frame.is_some());
		mm.check_invariants();
	}
}
