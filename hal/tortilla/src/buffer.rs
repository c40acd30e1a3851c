//! Fixed-size byte buffers
//!
//! A buffer is a plain `[u8; N]`: its length is part of its type, so the
//! length handed to a bound callback can never disagree with the memory
//! behind it. `Buffer<0>` is the "no data" value used for the unused side
//! of a write-only or read-only transfer.

/// Byte buffer whose length is fixed at compile time
pub type Buffer<const N: usize> = [u8; N];

/// The zero-length buffer
///
/// Its slice has a dangling (well-aligned, non-null) base pointer that is
/// never dereferenced because the length is 0.
pub const EMPTY: Buffer<0> = [];
