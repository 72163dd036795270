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

//! RANDOM: evict a uniformly random resident frame.

use super::{Context, Policy};
use crate::entity::FrameId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Random {
	rng: StdRng,
}

impl Random {
	pub fn new() -> Self {
		Random {
			rng: StdRng::from_entropy(),
		}
	}

	/// Constructs a `Random` with a fixed seed, for reproducible tests.
	pub fn with_seed(seed: u64) -> Self {
		Random {
			rng: StdRng::seed_from_u64(seed),
		}
	}
}

impl Policy for Random {
	fn allocate(&mut self, cx: &mut Context, _page: u32) -> FrameId {
		if cx.mm.free_count == 0 {
			let victim = self.rng.gen_range(0..cx.mm.nr_frames as u32);
			cx.mm.steal(victim);
		}
		cx.mm.alloc_free_frame()
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
	fn always_leaves_some_frame_resident_after_a_miss() {
		let mut mm = Mm::new(2, 4, 1);
		let mut look = NoLookahead;
		let mut cx = Context { mm: &mut mm, look: &mut look, turn: 0 };
		let mut policy = Random::with_seed(7);
		policy.read(&mut cx, 0).unwrap();
		policy.read(&mut cx, 1).unwrap();
		// Both frames are now occupied; a third distinct page forces a steal.
		policy.read(&mut cx, 2).unwrap();
		assert_eq!(mm.free_count, 0);
		mm.check_invariants();
	}
}
