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

//! The free list and resident-set primitives every policy composes its
//! eviction logic on top of.

use crate::entity::{Entities, FrameFlags, FrameId, FrameStore, ObjectId, ObjectPageStore, PageId};
use crate::list::List;

/// Emulated memory subsystem: arenas, free list, and the run's counters.
/// Policy-specific lists and tuning parameters live alongside this in each
/// policy's own state, not here (see `policy::mod`).
pub struct Mm {
	pub entities: Entities,
	pub free: List,
	pub free_count: u64,
	pub nr_frames: u64,
	pub nr_vpages: u64,
	pub nr_objects: u64,
	pub hits: u64,
	pub misses: u64,
	pub total: u64,
}

impl Mm {
	pub fn new(nr_frames: u64, nr_vpages: u64, nr_objects: u64) -> Self {
		let entities = Entities::new(nr_frames, nr_vpages, nr_objects);
		let mut mm = Mm {
			entities,
			free: List::new(),
			free_count: 0,
			nr_frames,
			nr_vpages,
			nr_objects,
			hits: 0,
			misses: 0,
			total: 0,
		};
		for id in 0..nr_frames as u32 {
			mm.free.push_back(&mut FrameStore(&mut mm.entities.frames), id);
		}
		mm.free_count = nr_frames;
		mm
	}

	/// Removes and returns a free frame. Panics if none is free; callers must
	/// have made room first (by stealing) when `free_count == 0`.
	pub fn alloc_free_frame(&mut self) -> FrameId {
		debug_assert!(self.free_count > 0);
		let id = self.free.front().expect("free list nonempty");
		self.free.remove(&mut FrameStore(&mut self.entities.frames), id);
		self.free_count -= 1;
		debug_assert!(self.entities.frames[id as usize].page.is_none());
		id
	}

	/// Returns a frame to the free list, clearing its flags and resident page.
	pub fn release_frame(&mut self, frame: FrameId) {
		debug_assert!(self.entities.frames[frame as usize].page.is_none());
		self.entities.frames[frame as usize].flags = FrameFlags::empty();
		self.free.push_back(&mut FrameStore(&mut self.entities.frames), frame);
		self.free_count += 1;
	}

	/// Binds `page` and `frame` together. Both sides must be currently unbound.
	pub fn place(&mut self, page: PageId, frame: FrameId) {
		debug_assert!(self.entities.pages[page as usize].frame.is_none());
		debug_assert!(self.entities.frames[frame as usize].page.is_none());
		self.entities.pages[page as usize].frame = Some(frame);
		self.entities.frames[frame as usize].page = Some(page);
		log::trace!("place page {page:#x} in frame {frame:#x}");
	}

	/// Observable hook: a page has just become resident and readable.
	pub fn pagein(&self, page: PageId) {
		debug_assert!(self.entities.pages[page as usize].frame.is_some());
		log::trace!("pagein page {page:#x}");
	}

	/// Observable hook: a dirty frame's contents are flushed before reuse.
	/// Clears the dirty flag.
	pub fn pageout(&mut self, frame: FrameId) {
		let f = &mut self.entities.frames[frame as usize];
		debug_assert!(f.page.is_some());
		log::trace!("pageout frame {frame:#x}");
		f.flags.remove(FrameFlags::DIRTY);
	}

	/// Unbinds a resident frame from its page and releases the frame.
	pub fn free_frame(&mut self, frame: FrameId) {
		let page = self.entities.frames[frame as usize]
			.page
			.expect("free_frame on a frame that is not resident");
		log::trace!("free frame {frame:#x} (was page {page:#x})");
		self.entities.pages[page as usize].frame = None;
		self.entities.frames[frame as usize].page = None;
		self.release_frame(frame);
	}

	/// Evicts whatever page currently occupies `frame`, flushing it first if
	/// dirty. A no-op if the frame is already free.
	pub fn steal(&mut self, frame: FrameId) {
		if self.entities.frames[frame as usize].page.is_some() {
			if self.entities.frames[frame as usize]
				.flags
				.contains(FrameFlags::DIRTY)
			{
				self.pageout(frame);
			}
			self.free_frame(frame);
		}
	}

	/// Binds `page` to `object` at `index` the first time it is seen; on
	/// subsequent sightings, checks the identity has not changed.
	pub fn bind_object(
		&mut self,
		page: PageId,
		object: ObjectId,
		index: u64,
	) -> Result<(), crate::error::Error> {
		let p = &mut self.entities.pages[page as usize];
		if !p.seen {
			p.seen = true;
			p.object = Some(object);
			p.index = index;
			let mut store = ObjectPageStore(&mut self.entities.pages);
			self.entities.objects[object as usize]
				.pages
				.push_front(&mut store, page);
			return Ok(());
		}
		if p.object != Some(object) {
			return Err(crate::error::Error::ObjectMismatch {
				page: page as u64,
				first: p.object.expect("seen page has a bound object") as u64,
				second: object as u64,
			});
		}
		if p.index != index {
			return Err(crate::error::Error::IndexMismatch {
				page: page as u64,
				first: p.index,
				second: index,
			});
		}
		Ok(())
	}

	/// Checks the invariants that must hold after every driver step (section 3
	/// / section 8's universal invariants). Compiled out of release builds.
	#[cfg(debug_assertions)]
	pub fn check_invariants(&self) {
		let mut resident = 0u64;
		for frame in &self.entities.frames {
			if let Some(page) = frame.page {
				resident += 1;
				assert_eq!(
					self.entities.pages[page as usize].frame,
					Some(frame.id),
					"frame {} points to page {page:#x} which does not point back",
					frame.id
				);
			}
		}
		assert_eq!(self.free_count + resident, self.nr_frames);
		assert_eq!(self.free.len(), self.free_count);
	}

	#[cfg(not(debug_assertions))]
	pub fn check_invariants(&self) {}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;

	#[test]
	fn alloc_place_and_steal_round_trip() {
		let mut mm = Mm::new(2, 4, 1);
		assert_eq!(mm.free_count, 2);
		let frame = mm.alloc_free_frame();
		mm.place(0, frame);
		mm.check_invariants();
		assert_eq!(mm.free_count, 1);
		mm.steal(frame);
		assert_eq!(mm.free_count, 2);
		assert!(mm.entities.pages[0].frame.is_none());
		mm.check_invariants();
	}

	#[test]
	fn steal_flushes_a_dirty_frame_before_freeing() {
		let mut mm = Mm::new(1, 1, 1);
		let frame = mm.alloc_free_frame();
		mm.place(0, frame);
		mm.entities.frames[frame as usize].flags.insert(FrameFlags::DIRTY);
		mm.steal(frame);
		assert!(!mm.entities.frames[frame as usize].flags.contains(FrameFlags::DIRTY));
		assert_eq!(mm.free_count, 1);
	}

	#[test]
	fn bind_object_rejects_identity_contradictions() {
		let mut mm = Mm::new(1, 1, 2);
		mm.bind_object(0, 0, 5).unwrap();
		assert!(matches!(
			mm.bind_object(0, 1, 5),
			Err(Error::ObjectMismatch { .. })
		));
		assert!(matches!(
			mm.bind_object(0, 0, 6),
			Err(Error::IndexMismatch { .. })
		));
		// Same identity again is fine.
		mm.bind_object(0, 0, 5).unwrap();
	}
}
