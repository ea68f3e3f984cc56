//! Segmented collections.
//!
//! - `deque`: double-ended queue over a map of fixed-size buffers

pub mod deque;

pub use deque::{
    buffer_size, BoundsError, Cursor, Deque, DequeError, IntoIter, Iter, IterMut, Position,
    DEFAULT_BUFFER_BYTES,
};
