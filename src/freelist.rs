//! The free-list manager: first-fit search, split-on-allocate,
//! address-ordered insertion, and bidirectional coalesce-on-free.
//!
//! Every function here assumes the caller already holds the owning heap's
//! lock; none of them touch a [`crate::region::RegionSource`] except
//! [`allocate`], which may grow the region once it exhausts the list.

use crate::alloc::AllocError;
use crate::chunk::*;
use crate::error::report_corruption;
use crate::region::{self, RegionSource, RegionState};

#[cfg(any(all(test, feature = "check_contracts_in_tests"), feature = "check_contracts"))]
use contracts::*;
#[cfg(not(any(all(test, feature = "check_contracts_in_tests"), feature = "check_contracts")))]
use disabled_contracts::*;

/// The free-list head. Null means the list is empty.
pub(crate) struct FreeListState {
	pub(crate) head: *mut u8,
}

impl FreeListState {
	pub(crate) const fn new() -> Self {
		Self { head: core::ptr::null_mut() }
	}
}

/// Computes the total chunk size (header + padding + payload, rounded and
/// floored at `MIN_CHUNK`) needed to satisfy a user request of `s` bytes.
#[debug_ensures(ret.is_ok() -> is_aligned_size(*ret.as_ref().unwrap()) && *ret.as_ref().unwrap() >= MIN_CHUNK)]
pub(crate) fn required_chunk_size(s: usize) -> Result<usize, AllocError> {
	let aligned = align_up(s, CHUNK_ALIGN);
	let need = aligned
		.checked_add(PAD)
		.and_then(|v| v.checked_add(HEADER_BYTES))
		.map(|v| v.max(MIN_CHUNK));

	match need {
		Some(need) if need < MAX_REQUEST && need >= s => Ok(need),
		_ => Err(AllocError),
	}
}

/// Finds the first free chunk of at least `need` bytes, growing the region
/// if none exists, splitting off a high-address remainder when the match
/// is oversized, and unlinking the chosen chunk from the list.
///
/// # Safety
/// Must be called with the heap's lock held.
#[debug_requires(is_aligned_size(need) && need >= MIN_CHUNK)]
#[debug_ensures(ret.is_err() || unsafe { read_size(*ret.as_ref().unwrap()) } >= need)]
pub(crate) unsafe fn allocate<R: RegionSource>(
	region: &R,
	region_state: &mut RegionState,
	list: &mut FreeListState,
	need: usize,
) -> Result<*mut u8, AllocError> {
	unsafe {
		// `q`, `p`, `r` all start at the free-list head and walk it in
		// lockstep, one node apart, exactly as the scan in `deallocate`.
		let mut q: *mut u8 = list.head;
		let mut p: *mut u8 = list.head;
		let mut r: *mut u8 = list.head;

		while !r.is_null() {
			let size = read_size(r);
			if !is_aligned_size(size) {
				report_corruption("bogus heap chunk size");
			}
			if size >= need {
				break;
			}
			q = p;
			p = r;
			r = read_next(r);
		}

		if r.is_null() {
			// No chunk was big enough. If the tail free chunk (`p`) is
			// flush with the current break, extend it instead of growing
			// a disjoint new chunk.
			let brk_now = region.sbrk(0);
			let adjust = if !p.is_null() && p.add(read_size(p)) == brk_now {
				read_size(p)
			} else {
				0
			};

			let grown = region::grow(region, region_state, need - adjust)?;

			if adjust > 0 {
				r = p;
				p = q;
			} else {
				r = grown;
				if p.is_null() {
					p = grown;
				}
			}
			write_size(r, need);
			write_next(r, core::ptr::null_mut());
		}

		// Split-on-allocate: the leftover, if any, becomes a new free
		// chunk at the high-address end and is linked where `r` used to
		// point.
		let rem = read_size(r) - need;
		if rem >= MIN_CHUNK {
			let t = r.add(need);
			write_size(t, rem);
			write_next(t, read_next(r));
			write_size(r, need);
			write_next(r, t);
		}

		// Unlink `r`. `p == r` exactly when the walk never advanced past
		// the list head, i.e. `r` is (or was) the head itself.
		if core::ptr::eq(p, r) {
			list.head = read_next(r);
		} else {
			write_next(p, read_next(r));
		}

		Ok(r)
	}
}

/// Inserts `c` (a chunk header, not a user pointer) into the free list in
/// address order, coalescing with either or both neighbours when they are
/// physically adjacent.
///
/// # Safety
/// Must be called with the heap's lock held. `c` must be a chunk header
/// recovered from a live allocation, not currently on the free list.
#[debug_requires(!c.is_null())]
pub(crate) unsafe fn deallocate(list: &mut FreeListState, c: *mut u8) {
	unsafe {
		let size = read_size(c);
		if !is_aligned_size(size) {
			report_corruption("bogus heap chunk size");
		}

		if list.head.is_null() {
			write_next(c, core::ptr::null_mut());
			list.head = c;
			return;
		}

		if (c as usize) < (list.head as usize) {
			if c.add(size) == list.head {
				let merged_next = read_next(list.head);
				write_size(c, size + read_size(list.head));
				write_next(c, merged_next);
			} else {
				write_next(c, list.head);
			}
			list.head = c;
			return;
		}

		// Walk to the largest node `p` with `p <= c`; `q` is its successor
		// (or null).
		let mut p = list.head;
		let mut q = read_next(p);
		while !q.is_null() && (q as usize) <= (c as usize) {
			p = q;
			q = read_next(p);
		}

		if p.add(read_size(p)) == c {
			// Left-flush: absorb `c` into `p`, then check whether the
			// merged chunk is now also flush with `q`.
			let mut new_size = read_size(p) + size;
			write_size(p, new_size);
			if p.add(new_size) == q {
				new_size += read_size(q);
				write_size(p, new_size);
				write_next(p, read_next(q));
			}
		} else if p.add(read_size(p)) as usize > c as usize {
			report_corruption("possible double free");
		} else if c.add(size) == q {
			// Right-flush only.
			write_size(c, size + read_size(q));
			write_next(c, read_next(q));
			write_next(p, c);
		} else {
			// No adjacency either side: plain address-ordered insert.
			write_next(c, q);
			write_next(p, c);
		}
	}
}
