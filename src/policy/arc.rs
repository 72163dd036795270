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

//! ARC (Adaptive Replacement Cache): shares CAR's T1/T2/B1/B2 directory but
//! keeps T1/T2 in strict LRU order instead of clock order, and adapts the
//! target T1 size `p` on every ghost hit.
//!
//! The T1-shrink tie-break is implemented exactly as stated in this project's
//! specification (`|T1| > p OR (miss was in B2 AND |T1| == p)`), which is not
//! the tie-break given in the original ARC paper.

use super::{Context, Policy};
use crate::entity::{FrameId, PageId, PolicyPageStore};
use crate::list::List;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Queue {
	T1,
	T2,
	B1,
	B2,
}

pub struct Arc {
	t1: List,
	t2: List,
	b1: List,
	b2: List,
	p: u64,
	tag: Vec<Option<Queue>>,
}

impl Arc {
	pub fn new() -> Self {
		Arc {
			t1: List::new(),
			t2: List::new(),
			b1: List::new(),
			b2: List::new(),
			p: 0,
			tag: Vec::new(),
		}
	}

	fn directory_admit(&mut self, cx: &mut Context) {
		let n = cx.mm.nr_frames;
		if self.t1.len() + self.b1.len() == n {
			if !self.b1.is_empty() {
				let victim = self.b1.back().expect("b1 nonempty");
				self.b1.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), victim);
				self.tag[victim as usize] = None;
			} else if let Some(victim) = self.t1.back() {
				let frame = cx.mm.entities.pages[victim as usize]
					.frame
					.expect("t1 entry is resident");
				self.t1.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), victim);
				self.tag[victim as usize] = None;
				cx.mm.steal(frame);
			}
		} else {
			let total = self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len();
			if total >= n && total == 2 * n {
				if let Some(victim) = self.b2.back() {
					self.b2.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), victim);
					self.tag[victim as usize] = None;
				}
			}
		}
	}

	fn shrink_for_space(&mut self, cx: &mut Context, miss_was_b2: bool) {
		if cx.mm.free_count > 0 {
			return;
		}
		let shrink_t1 = !self.t1.is_empty()
			&& (self.t1.len() as u64 > self.p || (miss_was_b2 && self.t1.len() as u64 == self.p));
		if shrink_t1 {
			let victim = self.t1.back().expect("t1 nonempty");
			let frame = cx.mm.entities.pages[victim as usize].frame.expect("t1 entry is resident");
			let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
			self.t1.remove(&mut store, victim);
			self.b1.push_front(&mut store, victim);
			self.tag[victim as usize] = Some(Queue::B1);
			cx.mm.steal(frame);
		} else {
			let victim = self.t2.back().expect("t2 nonempty when t1 cannot shrink");
			let frame = cx.mm.entities.pages[victim as usize].frame.expect("t2 entry is resident");
			let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
			self.t2.remove(&mut store, victim);
			self.b2.push_front(&mut store, victim);
			self.tag[victim as usize] = Some(Queue::B2);
			cx.mm.steal(frame);
		}
	}
}

impl Policy for Arc {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.tag = vec![None; mm.nr_vpages as usize];
	}

	fn touch(&mut self, cx: &mut Context, page: PageId) {
		let was_t1 = self.tag[page as usize] == Some(Queue::T1);
		let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
		if was_t1 {
			self.t1.remove(&mut store, page);
		} else {
			self.t2.remove(&mut store, page);
		}
		self.t2.push_front(&mut store, page);
		self.tag[page as usize] = Some(Queue::T2);
	}

	fn allocate(&mut self, cx: &mut Context, page: PageId) -> FrameId {
		let n = cx.mm.nr_frames;
		let was_b1 = self.tag[page as usize] == Some(Queue::B1);
		let was_b2 = self.tag[page as usize] == Some(Queue::B2);

		if was_b1 {
			let b1 = self.b1.len().max(1);
			let b2 = self.b2.len();
			self.p = (self.p + (b2 / b1).max(1)).min(n);
		} else if was_b2 {
			let b1 = self.b1.len();
			let b2 = self.b2.len().max(1);
			self.p = self.p.saturating_sub((b1 / b2).max(1));
		} else {
			self.directory_admit(cx);
		}

		self.shrink_for_space(cx, was_b2);

		let frame = cx.mm.alloc_free_frame();
		let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
		if was_b1 {
			self.b1.remove(&mut store, page);
		} else if was_b2 {
			self.b2.remove(&mut store, page);
		}
		self.t2_or_t1_insert(&mut store, page, was_b1 || was_b2);
		frame
	}

	fn punch(&mut self, cx: &mut Context, page: PageId) {
		match self.tag[page as usize] {
			Some(Queue::T1) | Some(Queue::T2) => {
				let frame = cx.mm.entities.pages[page as usize]
					.frame
					.expect("tagged resident page has a frame");
				let was_t1 = self.tag[page as usize] == Some(Queue::T1);
				let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
				if was_t1 {
					self.t1.remove(&mut store, page);
				} else {
					self.t2.remove(&mut store, page);
				}
				self.tag[page as usize] = None;
				cx.mm.free_frame(frame);
			}
			Some(Queue::B1) => {
				self.b1.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
				self.tag[page as usize] = None;
			}
			Some(Queue::B2) => {
				self.b2.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
				self.tag[page as usize] = None;
			}
			None => {}
		}
	}
}

impl Arc {
	fn t2_or_t1_insert(&mut self, store: &mut PolicyPageStore<'_>, page: PageId, was_ghost_hit: bool) {
		if was_ghost_hit {
			self.t2.push_front(store, page);
			self.tag[page as usize] = Some(Queue::T2);
		} else {
			self.t1.push_front(store, page);
			self.tag[page as usize] = Some(Queue::T1);
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
	fn ghost_hit_in_b1_grows_p_and_lands_in_t2() {
		let mut mm = Mm::new(2, 2, 1);
		let mut look = NoLookahead;
		let mut policy = Arc::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.tag[0] = Some(Queue::B1);
			policy.b1.push_back(&mut PolicyPageStore(&mut cx.mm.entities.pages), 0);
			let before = policy.p;
			policy.read(&mut cx, 0).unwrap();
			assert!(policy.p > before);
		}
		assert_eq!(policy.tag[0], Some(Queue::T2));
		mm.check_invariants();
	}

	#[test]
	fn a_hit_on_a_t1_entry_promotes_it_to_the_t2_head() {
		let mut mm = Mm::new(2, 3, 1);
		let mut look = NoLookahead;
		let mut policy = Arc::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.read(&mut cx, 0).unwrap();
			policy.read(&mut cx, 1).unwrap();
			policy.read(&mut cx, 0).unwrap();
		}
		assert_eq!(policy.t2.front(), Some(0));
		assert_eq!(policy.tag[0], Some(Queue::T2));
		mm.check_invariants();
	}
}
