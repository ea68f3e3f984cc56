//! # `segdeque` - Segmented Double-Ended Queue
//!
//! A double-ended queue that stores its elements in equally sized buffers
//! reached through a central map, with constant-time access by index,
//! amortized constant-time growth at both ends, and an allocator seam for
//! every block it acquires.
//!
//! ## Guarantees
//!
//! ### Stable storage
//! - **No bulk moves**: pushing at either end allocates at most one buffer
//!   and never relocates an existing element. Only the map of buffer
//!   handles is ever reallocated.
//! - **Ownership by handle**: every buffer is held by exactly one move-only
//!   handle in the map, so a buffer is released exactly once.
//!
//! ### Failure atomicity
//! - **Allocation**: a failed `try_*` operation returns the allocator's
//!   error and leaves the deque as it was; any buffer allocated
//!   speculatively is released again.
//! - **Construction**: a failing element factory leaves no partially built
//!   element behind; bulk construction drops the prefix it built.
//!
//! ## Architecture
//!
//! 1. **Allocation** ([`alloc`]):
//!    - [`RawAlloc`]: the allocator seam, with [`Global`] as the default
//!    - `construct`/`destroy` helpers and the [`ScopedInit`](alloc::ScopedInit) guard
//!
//! 2. **Cursors** ([`cursor`]):
//!    - Forward, bidirectional and random-access capability traits
//!    - Generic `advance`/`distance` that pick the constant-time path for
//!      random-access cursors
//!
//! 3. **Deque** ([`collections::deque`]):
//!    - `(node, offset)` [`Position`] arithmetic across buffers
//!    - The map of buffer handles with in-place recentring and growth
//!    - [`Deque`] itself, its [`Cursor`], and iterators
//!
//! ## Example
//!
//! ```rust
//! use segdeque::Deque;
//!
//! let mut deque: Deque<i32> = (0..10).collect();
//! deque.push_front(-1);
//! deque.erase(3..6);
//! assert_eq!(deque.len(), 8);
//!
//! let cursor = deque.begin() + 3;
//! assert_eq!(cursor.get(), Some(&5));
//! assert_eq!(deque.end() - cursor, 5);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {};
}

pub mod alloc;
pub mod collections;
pub mod cursor;

pub use alloc::{AllocError, Global, RawAlloc};
pub use collections::{BoundsError, Cursor, Deque, DequeError, IntoIter, Iter, IterMut, Position};
pub use cursor::{BidirectionalCursor, Category, ForwardCursor, RandomAccessCursor};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // Positions are two words and cursors add one reference.
    assert!(mem::size_of::<Position>() == 2 * mem::size_of::<usize>());
    assert!(mem::size_of::<Cursor<'static, u64>>() == 3 * mem::size_of::<usize>());

    // The default allocator adds nothing to a deque.
    assert!(mem::size_of::<Global>() == 0);

    // Automatic buffer sizing.
    assert!(Deque::<u8>::BUFFER_SIZE == 512);
    assert!(Deque::<u64>::BUFFER_SIZE == 64);
    assert!(Deque::<[u8; 4096]>::BUFFER_SIZE == 1);
};
