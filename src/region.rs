//! The region source collaborator (a sequential-break primitive) and the
//! aligned-growth logic layered on top of it.

use core::cell::{Cell, UnsafeCell};
use core::mem::MaybeUninit;

use crate::alloc::AllocError;
use crate::chunk::{align_up_ptr, CHUNK_ALIGN};

/// Sentinel returned by [`RegionSource::sbrk`] on failure, distinct from
/// any address a successful call can return. Mirrors the C convention
/// `(void *) -1`, which is also exactly what `libc::sbrk` returns.
pub const SBRK_FAILED: *mut u8 = usize::MAX as *mut u8;

/// The environment primitive that extends the process's heap region.
///
/// `sbrk(0)` queries the current break without growing anything.
/// `sbrk(n)` with `n > 0` grows the region by `n` bytes and returns the
/// break *before* the grant (the start of the newly available bytes).
/// Successive successful grants from the same source return strictly
/// increasing addresses; a failed call returns [`SBRK_FAILED`].
pub trait RegionSource {
	fn sbrk(&self, increment: isize) -> *mut u8;
}

/// Tracks the region's starting address, captured lazily on first grant.
pub(crate) struct RegionState {
	pub(crate) region_start: *mut u8,
}

impl RegionState {
	pub(crate) const fn new() -> Self {
		Self { region_start: core::ptr::null_mut() }
	}
}

/// Obtains `n` bytes from `region`, aligned to `CHUNK_ALIGN`.
///
/// Pays for the chunk-alignment correction only the first time the region
/// source hands back a misaligned address; every later grant inherits the
/// alignment of the one before it.
///
/// # Safety
/// Must be called with the heap's lock held.
pub(crate) unsafe fn grow<R: RegionSource>(
	region: &R,
	state: &mut RegionState,
	n: usize,
) -> Result<*mut u8, AllocError> {
	if state.region_start.is_null() {
		let start = region.sbrk(0);
		if start == SBRK_FAILED {
			return Err(AllocError);
		}
		state.region_start = start;
	}

	let p = region.sbrk(n as isize);
	if p == SBRK_FAILED {
		return Err(AllocError);
	}

	let q = align_up_ptr(p, CHUNK_ALIGN);
	if q == p {
		return Ok(p);
	}

	let padding = q as usize - p as usize;
	let p2 = region.sbrk(padding as isize);
	if p2 == SBRK_FAILED {
		return Err(AllocError);
	}
	Ok(q)
}

/// A [`RegionSource`] backed by the real process break, via `libc::sbrk`.
///
/// Only available on `std` + unix-like targets, where a process data
/// segment and a `sbrk(2)` syscall actually exist.
#[cfg(all(feature = "std", unix))]
#[derive(Debug, Default, Clone, Copy)]
pub struct SbrkRegion;

#[cfg(all(feature = "std", unix))]
impl SbrkRegion {
	pub const fn new() -> Self {
		Self
	}
}

#[cfg(all(feature = "std", unix))]
impl RegionSource for SbrkRegion {
	fn sbrk(&self, increment: isize) -> *mut u8 {
		unsafe { libc::sbrk(increment as libc::intptr_t) as *mut u8 }
	}
}

#[cfg(target_pointer_width = "64")]
type ChunkAlignMarker = crate::align::Align8;
#[cfg(target_pointer_width = "32")]
type ChunkAlignMarker = crate::align::Align4;
#[cfg(target_pointer_width = "16")]
type ChunkAlignMarker = crate::align::Align2;

#[repr(C)]
struct AlignedBuf<const N: usize> {
	_align: ChunkAlignMarker,
	bytes: [MaybeUninit<u8>; N],
}

impl<const N: usize> AlignedBuf<N> {
	const fn new() -> Self {
		Self { _align: ChunkAlignMarker, bytes: [MaybeUninit::uninit(); N] }
	}
}

/// A [`RegionSource`] backed by a fixed-size buffer embedded in the type,
/// with a break cursor that only ever moves forward inside it.
///
/// Useful on targets with no `sbrk(2)` (embedded, `no_std`) and for
/// deterministic tests: unlike the real process break, it never competes
/// with the system allocator for address space.
pub struct StaticRegion<const N: usize> {
	buf: UnsafeCell<AlignedBuf<N>>,
	cursor: Cell<usize>,
}

impl<const N: usize> StaticRegion<N> {
	pub const fn new() -> Self {
		assert!(N > 0, "static region must hold at least one byte");
		Self { buf: UnsafeCell::new(AlignedBuf::new()), cursor: Cell::new(0) }
	}

	fn base(&self) -> *mut u8 {
		self.buf.get() as *mut u8
	}
}

impl<const N: usize> Default for StaticRegion<N> {
	fn default() -> Self {
		Self::new()
	}
}

// SAFETY: every call into a `StaticRegion` happens while the owning
// `Heap`'s lock is held, which serializes access to `cursor` and `buf`
// just as the real process break is serialized by the kernel.
unsafe impl<const N: usize> Sync for StaticRegion<N> {}

impl<const N: usize> RegionSource for StaticRegion<N> {
	fn sbrk(&self, increment: isize) -> *mut u8 {
		let cur = self.cursor.get();
		if increment == 0 {
			return unsafe { self.base().add(cur) };
		}
		if increment < 0 {
			// This crate never shrinks the region; the only
			// negative-increment caller would be a shrink operation,
			// which does not exist.
			return SBRK_FAILED;
		}
		let inc = increment as usize;
		let new_cur = match cur.checked_add(inc) {
			Some(v) if v <= N => v,
			_ => return SBRK_FAILED,
		};
		let prev_end = unsafe { self.base().add(cur) };
		self.cursor.set(new_cur);
		prev_end
	}
}
