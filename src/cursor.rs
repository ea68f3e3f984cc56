//! Cursor capability traits and the generic algorithms built on them.
//!
//! A cursor is a position in a sequence that can be read and moved. What a
//! cursor can do is expressed by which traits it implements:
//!
//! | Trait | Moves | `advance_by` / `distance_to` |
//! |-------|-------|------------------------------|
//! | [`ForwardCursor`] | forward one step | \(O(n)\) stepping |
//! | [`BidirectionalCursor`] | both directions one step | \(O(n)\) stepping |
//! | [`RandomAccessCursor`] | any signed offset | \(O(1)\) |
//!
//! The generic algorithms ([`advance`], [`distance`]) call provided trait
//! methods; random-access cursors override those methods with constant-time
//! versions, so the right implementation is chosen at compile time by the
//! cursor type alone.

/// The capability set of a cursor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Single steps forward.
    Forward,
    /// Single steps in both directions.
    Bidirectional,
    /// Arbitrary signed jumps and constant-time distance.
    RandomAccess,
}

/// A cursor that can be read and stepped forward.
///
/// Equality means "same position in the same sequence".
pub trait ForwardCursor: Clone + PartialEq {
    /// The item yielded by [`ForwardCursor::current`].
    type Item;

    /// Capability set of this cursor type.
    const CATEGORY: Category = Category::Forward;

    /// Returns the item under the cursor, or `None` past the end.
    fn current(&self) -> Option<Self::Item>;

    /// Moves one step forward.
    fn move_next(&mut self);

    /// Moves `n` steps forward.
    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.move_next();
        }
    }

    /// Counts the steps from `self` to `last`.
    ///
    /// `last` must be reachable from `self`.
    fn distance_to(&self, last: &Self) -> usize {
        let mut cursor = self.clone();
        let mut n = 0;
        while cursor != *last {
            cursor.move_next();
            n += 1;
        }
        n
    }
}

/// A cursor that can also step backward.
pub trait BidirectionalCursor: ForwardCursor {
    /// Moves one step backward.
    fn move_prev(&mut self);

    /// Moves `n` steps backward.
    fn retreat_by(&mut self, n: usize) {
        for _ in 0..n {
            self.move_prev();
        }
    }
}

/// A cursor with constant-time jumps and distance.
///
/// Implementors should override [`ForwardCursor::advance_by`],
/// [`ForwardCursor::distance_to`] and [`BidirectionalCursor::retreat_by`]
/// in terms of [`RandomAccessCursor::seek`] and
/// [`RandomAccessCursor::offset_from`], and set
/// `CATEGORY = Category::RandomAccess`.
pub trait RandomAccessCursor: BidirectionalCursor + PartialOrd {
    /// Moves by a signed offset.
    fn seek(&mut self, n: isize);

    /// Signed number of steps from `origin` to `self`.
    fn offset_from(&self, origin: &Self) -> isize;
}

/// Moves `cursor` by a signed number of steps.
///
/// \(O(1)\) for random-access cursors, \(O(|n|)\) otherwise.
pub fn advance<C: BidirectionalCursor>(cursor: &mut C, n: isize) {
    if n >= 0 {
        cursor.advance_by(n.unsigned_abs());
    } else {
        cursor.retreat_by(n.unsigned_abs());
    }
}

/// Number of steps from `first` to `last`.
///
/// \(O(1)\) for random-access cursors, \(O(n)\) otherwise.
pub fn distance<C: ForwardCursor>(first: &C, last: &C) -> usize {
    first.distance_to(last)
}

/// Returns the category of a cursor type.
pub const fn category_of<C: ForwardCursor>() -> Category {
    C::CATEGORY
}
