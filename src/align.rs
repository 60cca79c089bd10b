//! Zero-sized marker types used to force a byte buffer to a specific
//! alignment, independent of its length.
//!
//! `CHUNK_ALIGN` only ever takes one of a few concrete values, tracking a
//! target's pointer width, so a macro produces one marker per width rather
//! than a fully generic `Align<N>` type.

macro_rules! impl_aligns {
	($($name:ident as $n:literal),*) => { $(
		#[derive(Copy, Clone)]
		#[repr(align($n))]
		pub(crate) struct $name;
	)* };
}

impl_aligns!(Align2 as 2, Align4 as 4, Align8 as 8);
