//! Chunk layout: the `size`/`next` header, the skip-back encoding that lets
//! an over-aligned user pointer find its way back to that header, and the
//! derived size constants every other module builds on.

use core::mem::size_of;
use static_assertions::const_assert;

/// Alignment guaranteed to every user pointer returned by the public API.
pub const USER_ALIGN: usize = 8;

/// Alignment every chunk's `size` field is a multiple of. Derived from the
/// target's pointer width, exactly as the header itself is one `usize`.
pub const CHUNK_ALIGN: usize = size_of::<usize>();

const_assert!(CHUNK_ALIGN >= 2);
const_assert!(CHUNK_ALIGN.is_power_of_two());

/// Offset from a chunk's start to its `next`/payload slot.
pub const HEADER_BYTES: usize = size_of::<usize>();

const fn max_usize(a: usize, b: usize) -> usize {
	if a > b { a } else { b }
}

/// Extra bytes reserved in every request so a skip-back record can be
/// inserted without overrunning the chunk.
pub const PAD: usize = max_usize(USER_ALIGN, CHUNK_ALIGN) - CHUNK_ALIGN;

/// The smallest chunk that can be split off and still hold a free-list
/// pointer.
pub const MIN_CHUNK: usize = HEADER_BYTES + PAD + size_of::<usize>();

/// Alignment used by the page-aligned allocation variants.
pub const PAGE_ALIGN: usize = 4096;

/// Any request whose rounded size meets or exceeds this, or that wraps
/// while rounding, fails immediately with OOM.
pub const MAX_REQUEST: usize = 0x8000_0000;

const_assert!(MIN_CHUNK >= size_of::<usize>());

/// Wraps instead of panicking on overflow so an oversized `addr` yields a
/// small, obviously-wrong result for a caller's own overflow check (e.g.
/// `required_chunk_size`'s `need >= s`) to catch, rather than a debug-build
/// panic on the addition below.
#[inline]
pub(crate) const fn align_up(addr: usize, align: usize) -> usize {
	addr.wrapping_add(align - 1) & !(align - 1)
}

#[inline]
pub(crate) fn align_up_ptr(ptr: *mut u8, align: usize) -> *mut u8 {
	align_up(ptr as usize, align) as *mut u8
}

/// # Safety
/// `c` must point at a live chunk header.
#[inline]
pub(crate) unsafe fn read_size(c: *mut u8) -> usize {
	unsafe { core::ptr::read(c as *const usize) }
}

/// # Safety
/// `c` must point at a live chunk header.
#[inline]
pub(crate) unsafe fn write_size(c: *mut u8, v: usize) {
	unsafe { core::ptr::write(c as *mut usize, v) }
}

/// # Safety
/// `c` must point at a live, free chunk header (the `next` slot aliases the
/// user payload once the chunk is allocated).
#[inline]
pub(crate) unsafe fn read_next(c: *mut u8) -> *mut u8 {
	unsafe { core::ptr::read(c.add(HEADER_BYTES) as *const *mut u8) }
}

/// # Safety
/// `c` must point at a live, free chunk header.
#[inline]
pub(crate) unsafe fn write_next(c: *mut u8, next: *mut u8) {
	unsafe { core::ptr::write(c.add(HEADER_BYTES) as *mut *mut u8, next) }
}

/// A chunk size field is corrupt unless it is a multiple of `CHUNK_ALIGN`.
#[inline]
pub(crate) fn is_aligned_size(size: usize) -> bool {
	size & (CHUNK_ALIGN - 1) == 0
}

/// Recovers the real chunk header from a user pointer, undoing a skip-back
/// record if the chunk carries one.
///
/// # Safety
/// `user_ptr` must have been returned by a previous allocation from this
/// crate's heap and not yet freed.
pub(crate) unsafe fn chunk_from_user_ptr(user_ptr: *mut u8) -> *mut u8 {
	unsafe {
		let c = user_ptr.sub(HEADER_BYTES);
		let tagged = read_size(c);
		if tagged & 1 != 0 { c.sub(tagged & !1) } else { c }
	}
}

/// Bytes usable by the caller starting at `user_ptr`.
///
/// # Safety
/// `user_ptr` must have been returned by a previous allocation from this
/// crate's heap and not yet freed.
pub(crate) unsafe fn usable_size_from_ptr(user_ptr: *mut u8) -> usize {
	unsafe {
		let c = user_ptr.sub(HEADER_BYTES);
		let tagged = read_size(c);
		if tagged & 1 != 0 {
			let offset = tagged & !1;
			let real = c.sub(offset);
			read_size(real) - HEADER_BYTES - offset
		} else {
			tagged - HEADER_BYTES
		}
	}
}
