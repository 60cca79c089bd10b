//! The lock hook: whatever the embedding supplies to serialize concurrent
//! callers around a mutating API entry.
//!
//! [`RawLock::lock`] returns a guard whose `Drop` releases it, so every
//! early return in [`crate::Heap`]'s methods releases for free, including
//! the corruption-abort paths (where the process exits before `Drop` would
//! even run, which is fine — there is nothing left to release).

/// A lock hook. `NoLock` and [`StdMutexLock`] are the two provided
/// implementations; embeddings with their own synchronization primitive
/// (an RTOS mutex, a spinlock) can implement this trait directly.
pub trait RawLock {
	type Guard<'a>
	where
		Self: 'a;

	fn lock(&self) -> Self::Guard<'_>;
}

/// No synchronization at all: safe to construct, but a [`crate::Heap`]
/// built on it is only safe to use from one thread at a time, which the
/// caller must guarantee.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl RawLock for NoLock {
	type Guard<'a> = ();

	#[inline]
	fn lock(&self) -> Self::Guard<'_> {}
}

/// A real mutex, safe to share across threads. Acquiring it can block, and
/// every mutating call holds it for exactly the span of that call.
#[cfg(feature = "std")]
pub struct StdMutexLock(std::sync::Mutex<()>);

#[cfg(feature = "std")]
impl StdMutexLock {
	pub const fn new() -> Self {
		Self(std::sync::Mutex::new(()))
	}
}

#[cfg(feature = "std")]
impl Default for StdMutexLock {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(feature = "std")]
impl RawLock for StdMutexLock {
	type Guard<'a> = std::sync::MutexGuard<'a, ()>;

	fn lock(&self) -> Self::Guard<'_> {
		// A poisoned mutex means a prior call panicked mid-mutation. This
		// crate never panics on its success path, and a detected
		// corruption aborts the process instead of unwinding, so treating
		// poison as "just take it" cannot observe a torn free list.
		self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}
