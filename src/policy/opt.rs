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

//! OPT (Belady's clairvoyant optimal): on the first access, walks the entire
//! remaining trace through the look-ahead queue once and records, per page,
//! the ordered list of turns at which it will be read again. Eviction always
//! picks the resident page whose next use is farthest away, or never comes at
//! all.

use super::{generic_fault, Context, Policy};
use crate::entity::{FrameId, PageId};
use std::collections::VecDeque;

pub struct Opt {
	/// Per-page queue of future turns at which the page is read again, built
	/// once from the entire remaining trace and drained as those turns pass.
	future: Vec<VecDeque<u64>>,
	initialized: bool,
}

impl Opt {
	pub fn new() -> Self {
		Opt {
			future: Vec::new(),
			initialized: false,
		}
	}

	/// Scans the whole remaining trace exactly once, on the first access.
	/// A look-ahead parse error simply ends the scan early; the driver will
	/// surface the same error itself when it later reaches that line.
	fn ensure_initialized(&mut self, cx: &mut Context) {
		if self.initialized {
			return;
		}
		self.initialized = true;
		let mut i = 0usize;
		loop {
			let access = match cx.look.peek(i) {
				Ok(Some(access)) => access,
				_ => break,
			};
			if access.ty.may_fault() && (access.page as usize) < self.future.len() {
				let turn = cx.turn + 1 + i as u64;
				self.future[access.page as usize].push_back(turn);
			}
			i += 1;
		}
	}

	/// Drops the queue entry for the access under way, if one was recorded.
	fn consume_current(&mut self, page: PageId, turn: u64) {
		let queue = &mut self.future[page as usize];
		if queue.front() == Some(&turn) {
			queue.pop_front();
		}
	}

	fn evict_farthest_future_use(&mut self, cx: &mut Context) {
		let mut victim: Option<(FrameId, Option<u64>)> = None;
		for frame in &cx.mm.entities.frames {
			let Some(resident_page) = frame.page else { continue };
			let next_use = self.future[resident_page as usize].front().copied();
			let replace = match (victim, next_use) {
				(None, _) => true,
				(Some((_, None)), _) => false,
				(Some((_, Some(_))), None) => true,
				(Some((_, Some(current))), Some(candidate)) => candidate > current,
			};
			if replace {
				victim = Some((frame.id, next_use));
			}
		}
		let (victim_frame, _) = victim.expect("a resident frame exists when no frame is free");
		cx.mm.steal(victim_frame);
	}
}

impl Policy for Opt {
	fn init(&mut self, mm: &mut crate::mm::Mm) {
		self.future = vec![VecDeque::new(); mm.nr_vpages as usize];
		self.initialized = false;
	}

	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		self.ensure_initialized(cx);
		if cx.mm.free_count == 0 {
			self.evict_farthest_future_use(cx);
		}
		cx.mm.alloc_free_frame()
	}

	fn read(&mut self, cx: &mut Context, page: PageId) -> crate::error::Result<()> {
		self.ensure_initialized(cx);
		self.consume_current(page, cx.turn);
		generic_fault(self, cx, page)
	}

	fn read_ahead(&mut self, cx: &mut Context, page: PageId) -> crate::error::Result<()> {
		self.ensure_initialized(cx);
		self.consume_current(page, cx.turn);
		generic_fault(self, cx, page)
	}

	fn fault(&mut self, cx: &mut Context, page: PageId) -> crate::error::Result<()> {
		self.ensure_initialized(cx);
		self.consume_current(page, cx.turn);
		generic_fault(self, cx, page)
	}

	fn write(&mut self, cx: &mut Context, page: PageId) -> crate::error::Result<()> {
		self.ensure_initialized(cx);
		if cx.mm.entities.pages[page as usize].frame.is_none() {
			let frame = self.allocate(cx, page);
			cx.mm.place(page, frame);
		}
		Ok(())
	}

	fn punch(&mut self, cx: &mut Context, page: PageId) {
		self.ensure_initialized(cx);
		if let Some(frame) = cx.mm.entities.pages[page as usize].frame {
			cx.mm.free_frame(frame);
		}
	}
}
