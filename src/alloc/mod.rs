//! Raw allocation and in-place construction.
//!
//! - `allocator`: the [`RawAlloc`] trait, the [`Global`] allocator and [`AllocError`]
//! - `construct`: `construct`/`destroy` helpers and the [`ScopedInit`] guard

pub mod allocator;
pub mod construct;

pub use allocator::{AllocError, Global, RawAlloc};
pub use construct::{construct, destroy, destroy_range, ScopedInit};
