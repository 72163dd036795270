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

//! LINUX: a simplified 2.6-era `vmscan` two-list reclaim. Pages graduate from
//! inactive to active on a second touch; reclaim walks a shrinking priority
//! loop so that it keeps widening its scan window until it frees enough
//! frames, the same shape as the kernel's balance_pgdat/shrink_zone loop.

use super::{Context, Policy};
use crate::entity::{FrameFlags, FrameId, FrameStore, PageId};
use crate::list::List;

const PRIORITY_START: u32 = 12;
const SWAP_CLUSTER_MAX: u64 = 32;
/// Writeback of dirty pages is only attempted once scanning pressure has
/// pushed the priority below this, mirroring the kernel's reluctance to issue
/// I/O on a light scan.
const WRITEPAGE_PRIORITY_THRESHOLD: u32 = 9;

pub struct Linux {
	active: List,
	inactive: List,
	/// Per-frame: resident in `active` (true) or `inactive` (false).
	is_active: Vec<bool>,
	/// Per-frame policy reference bit, distinct from the driver's shared `REF`.
	referenced: Vec<bool>,
}

impl Linux {
	pub fn new() -> Self {
		Linux {
			active: List::new(),
			inactive: List::new(),
			is_active: Vec::new(),
			referenced: Vec::new(),
		}
	}

	fn shrink_active(&mut self, cx: &mut Context, n: u64) {
		for _ in 0..n {
			let Some(frame) = self.active.back() else { break };
			self.is_active[frame as usize] = false;
			self.referenced[frame as usize] = false;
			let mut store = FrameStore(&mut cx.mm.entities.frames);
			self.inactive.move_front(&mut store, &mut self.active, frame);
		}
	}

	fn shrink_inactive(&mut self, cx: &mut Context, n: u64, writepage_allowed: bool) -> u64 {
		let mut freed = 0;
		for _ in 0..n {
			let Some(frame) = self.inactive.back() else { break };
			let referenced = self.referenced[frame as usize];
			self.referenced[frame as usize] = false;
			let dirty = cx.mm.entities.frames[frame as usize].flags.contains(FrameFlags::DIRTY);
			if !dirty || (!referenced && writepage_allowed) {
				self.evict(cx, frame);
				freed += 1;
			} else {
				// Dirty and either still referenced or writeback not yet
				// permitted: keep it, but rotate to the inactive head so the
				// next scan examines different candidates.
				let mut store = FrameStore(&mut cx.mm.entities.frames);
				self.inactive.remove(&mut store, frame);
				self.inactive.push_front(&mut store, frame);
			}
		}
		freed
	}

	fn evict(&mut self, cx: &mut Context, frame: FrameId) {
		self.is_active[frame as usize] = false;
		self.referenced[frame as usize] = false;
		self.inactive.remove(&mut FrameStore(&mut cx.mm.entities.frames), frame);
		cx.mm.steal(frame);
	}

	fn reclaim(&mut self, cx: &mut Context) {
		let mut priority = PRIORITY_START;
		let mut freed = 0u64;
		loop {
			let writepage_allowed = priority < WRITEPAGE_PRIORITY_THRESHOLD;
			let active_len = self.active.len();
			if active_len > 0 {
				let scan = (active_len >> (priority + 1)).clamp(1, SWAP_CLUSTER_MAX.min(active_len));
				self.shrink_active(cx, scan);
			}
			let inactive_len = self.inactive.len();
			if inactive_len > 0 {
				let scan = (inactive_len >> (priority + 1)).clamp(1, SWAP_CLUSTER_MAX.min(inactive_len));
				freed += self.shrink_inactive(cx, scan, writepage_allowed);
			}
			if freed >= SWAP_CLUSTER_MAX || cx.mm.free_count > 0 {
				break;
			}
			if priority == 0 {
				// Priority exhausted without freeing anything (every inactive
				// candidate was dirty+referenced): force one frame out so the
				// caller always gets progress.
				if let Some(victim) = self.inactive.back() {
					self.evict(cx, victim);
				}
				break;
			}
			priority -= 1;
		}
	}
}

impl Policy for Linux {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.is_active = vec![false; mm.nr_frames as usize];
		self.referenced = vec![false; mm.nr_frames as usize];
	}

	fn touch(&mut self, cx: &mut Context, page: PageId) {
		let frame = cx.mm.entities.pages[page as usize].frame.expect("touch on a resident page");
		if self.is_active[frame as usize] {
			self.referenced[frame as usize] = true;
		} else if self.referenced[frame as usize] {
			self.referenced[frame as usize] = false;
			self.is_active[frame as usize] = true;
			let mut store = FrameStore(&mut cx.mm.entities.frames);
			self.active.move_front(&mut store, &mut self.inactive, frame);
		} else {
			self.referenced[frame as usize] = true;
		}
	}

	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			self.reclaim(cx);
		}
		let frame = cx.mm.alloc_free_frame();
		self.is_active[frame as usize] = false;
		self.referenced[frame as usize] = false;
		self.inactive.push_front(&mut FrameStore(&mut cx.mm.entities.frames), frame);
		frame
	}

	fn punch(&mut self, cx: &mut Context, page: PageId) {
		if let Some(frame) = cx.mm.entities.pages[page as usize].frame {
			{
				let mut store = FrameStore(&mut cx.mm.entities.frames);
				if self.is_active[frame as usize] {
					self.active.remove(&mut store, frame);
				} else {
					self.inactive.remove(&mut store, frame);
				}
			}
			cx.mm.free_frame(frame);
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
	fn a_second_touch_while_inactive_promotes_to_active() {
		let mut mm = Mm::new(2, 2, 1);
		let mut look = NoLookahead;
		let mut policy = Linux::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			let frame = cx.mm.entities.pages[0].frame.unwrap();
			assert!(!policy.is_active[frame as usize]);
			policy.read(&mut cx, 0).unwrap();
			assert!(!policy.is_active[frame as usize]); // referenced, still inactive
			policy.read(&mut cx, 0).unwrap();
			assert!(policy.is_active[frame as usize]); // second touch: promoted
		}
		mm.check_invariants();
	}

	#[test]
	fn reclaim_under_pressure_keeps_invariants_and_makes_progress() {
		let mut mm = Mm::new(4, 32, 1);
		let mut look = NoLookahead;
		let mut policy = Linux::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			for page in 0..32u32 {
				policy.read(&mut cx, page).unwrap();
			}
		}
		assert_eq!(mm.free_count, 0);
		mm.check_invariants();
	}
}
