//! Heap statistics: a `mallinfo`-shaped snapshot, derived by walking the
//! free list and querying the region extent.

use core::fmt;

/// Sentinel used for `arena` when the region source fails to answer a
/// break query.
pub const ARENA_UNKNOWN: usize = usize::MAX;

/// A snapshot of heap usage, analogous to glibc's `struct mallinfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
	/// Total bytes claimed from the region source so far (`break(0) -
	/// region_start`), or [`ARENA_UNKNOWN`] if the break query failed, or
	/// `0` if the region has never grown.
	pub arena: usize,
	/// Total bytes currently sitting on the free list.
	pub fordblks: usize,
	/// Bytes in live allocations: `arena - fordblks`.
	pub uordblks: usize,
}

impl fmt::Display for Stats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "max system bytes = {:>10}", self.arena)?;
		writeln!(f, "system bytes     = {:>10}", self.arena)?;
		writeln!(f, "in use bytes     = {:>10}", self.uordblks)
	}
}
