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

//! CAR (Clock with Adaptive Replacement): a clock-hand variant of ARC. T1/T2
//! hold resident pages, B1/B2 hold ghost identities; all four are expressed
//! as page queues threaded through [`crate::entity::Vpage::policy_link`],
//! since a page belongs to at most one of them at a time.

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

pub struct Car {
	t1: List,
	t2: List,
	b1: List,
	b2: List,
	/// Target T1 size.
	p: u64,
	/// Which of the four queues each page currently belongs to, if any.
	tag: Vec<Option<Queue>>,
	/// Per-page clock reference bit.
	referenced: Vec<bool>,
}

impl Car {
	pub fn new() -> Self {
		Car {
			t1: List::new(),
			t2: List::new(),
			b1: List::new(),
			b2: List::new(),
			p: 0,
			tag: Vec::new(),
			referenced: Vec::new(),
		}
	}

	fn replace(&mut self, cx: &mut Context) {
		loop {
			let target = self.p.max(1);
			let from_t1 = self.t1.len() >= target && !self.t1.is_empty();
			let page = if from_t1 {
				self.t1.front()
			} else {
				self.t2.front()
			}
			.or_else(|| if from_t1 { self.t2.front() } else { self.t1.front() })
			.expect("clock has a resident candidate when no frame is free");
			let from_t1 = self.tag[page as usize] == Some(Queue::T1);
			if self.referenced[page as usize] {
				self.referenced[page as usize] = false;
				let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
				if from_t1 {
					self.t1.remove(&mut store, page);
				} else {
					self.t2.remove(&mut store, page);
				}
				self.t2.push_back(&mut store, page);
				self.tag[page as usize] = Some(Queue::T2);
			} else {
				let frame = cx.mm.entities.pages[page as usize]
					.frame
					.expect("clock candidate is resident");
				let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
				if from_t1 {
					self.t1.remove(&mut store, page);
					self.b1.push_front(&mut store, page);
					self.tag[page as usize] = Some(Queue::B1);
				} else {
					self.t2.remove(&mut store, page);
					self.b2.push_front(&mut store, page);
					self.tag[page as usize] = Some(Queue::B2);
				}
				cx.mm.steal(frame);
				break;
			}
		}
	}

	fn directory_replace(&mut self, cx: &mut Context) {
		let n = cx.mm.nr_frames;
		if self.t1.len() + self.b1.len() == n {
			if let Some(victim) = self.b1.back() {
				self.b1.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), victim);
				self.tag[victim as usize] = None;
			}
		} else if self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len() == 2 * n {
			if let Some(victim) = self.b2.back() {
				self.b2.remove(&mut PolicyPageStore(&mut cx.mm.entities.pages), victim);
				self.tag[victim as usize] = None;
			}
		}
	}
}

impl Policy for Car {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.tag = vec![None; mm.nr_vpages as usize];
		self.referenced = vec![false; mm.nr_vpages as usize];
	}

	fn touch(&mut self, _cx: &mut Context, page: PageId) {
		self.referenced[page as usize] = true;
	}

	fn allocate(&mut self, cx: &mut Context, page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			self.replace(cx);
			if !matches!(self.tag[page as usize], Some(Queue::B1) | Some(Queue::B2)) {
				self.directory_replace(cx);
			}
		}
		let frame = cx.mm.alloc_free_frame();
		let n = cx.mm.nr_frames;
		match self.tag[page as usize] {
			Some(Queue::B1) => {
				let b1 = self.b1.len().max(1);
				let b2 = self.b2.len();
				self.p = (self.p + (b2 / b1).max(1)).min(n);
				let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
				self.b1.remove(&mut store, page);
				self.t2.push_back(&mut store, page);
				self.tag[page as usize] = Some(Queue::T2);
			}
			Some(Queue::B2) => {
				let b1 = self.b1.len();
				let b2 = self.b2.len().max(1);
				self.p = self.p.saturating_sub((b1 / b2).max(1));
				let mut store = PolicyPageStore(&mut cx.mm.entities.pages);
				self.b2.remove(&mut store, page);
				self.t2.push_back(&mut store, page);
				self.tag[page as usize] = Some(Queue::T2);
			}
			_ => {
				self.t1.push_back(&mut PolicyPageStore(&mut cx.mm.entities.pages), page);
				self.tag[page as usize] = Some(Queue::T1);
			}
		}
		self.referenced[page as usize] = false;
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
	fn promotion_from_b1_increases_the_target_t1_size_and_lands_in_t2() {
		let mut mm = Mm::new(2, 2, 1);
		let mut look = NoLookahead;
		let mut policy = Car::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			policy.tag[0] = Some(Queue::B1);
			policy
				.b1
				.push_back(&mut PolicyPageStore(&mut cx.mm.entities.pages), 0);
			let before = policy.p;
			policy.read(&mut cx, 0).unwrap();
			assert!(policy.p > before);
		}
		assert_eq!(policy.tag[0], Some(Queue::T2));
		mm.check_invariants();
	}

	#[test]
	fn clock_eviction_keeps_entity_invariants_intact() {
		let mut mm = Mm::new(2, 4, 1);
		let mut look = NoLookahead;
		let mut policy = Car::new();
		policy.init(&mut mm);
		{
			let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
			for page in 0..4u32 {
				policy.read(&mut cx, page).unwrap();
			}
		}
		assert_eq!(mm.free_count, 0);
		mm.check_invariants();
	}
}
