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

//! WORST: an adversarial one-step look-ahead. If the very next access in the
//! trace is already resident, evict its frame; otherwise fall back to a
//! uniform random choice, same as [`super::random::Random`].

use super::{Context, Policy};
use crate::entity::{FrameId, PageId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Worst {
	rng: StdRng,
}

impl Worst {
	pub fn new() -> Self {
		Worst {
			rng: StdRng::from_entropy(),
		}
	}

	/// Constructs a `Worst` with a fixed seed, for reproducible tests.
	pub fn with_seed(seed: u64) -> Self {
		Worst {
			rng: StdRng::seed_from_u64(seed),
		}
	}

	fn next_resident_frame(&self, cx: &mut Context) -> Option<FrameId> {
		let access = cx.look.peek(0).ok()??;
		let page = access.page;
		if page >= cx.mm.nr_vpages {
			return None;
		}
		cx.mm.entities.pages[page as usize].frame
	}
}

impl Policy for Worst {
	fn allocate(&mut self, cx: &mut Context, _page: PageId) -> FrameId {
		if cx.mm.free_count == 0 {
			let victim = self
				.next_resident_frame(cx)
				.unwrap_or_else(|| self.rng.gen_range(0..cx.mm.nr_frames as u32));
			cx.mm.steal(victim);
		}
		cx.mm.alloc_free_frame()
	}
}
