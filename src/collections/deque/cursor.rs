//! Random-access cursor over a [`Deque`].
//!
//! A cursor is a borrowed deque plus a [`Position`]. Moving it is pure
//! position arithmetic and never fails; reading re-checks the position
//! against the live range, so a cursor moved out of range reads `None`.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};
use core::ptr;

use super::position::Position;
use super::Deque;
use crate::alloc::{Global, RawAlloc};
use crate::cursor::{BidirectionalCursor, Category, ForwardCursor, RandomAccessCursor};

/// A position in a particular [`Deque`].
///
/// Cursors of the same deque compare and subtract in logical order;
/// comparing cursors of different deques yields `None`.
pub struct Cursor<'a, T, A: RawAlloc = Global, const BUF: usize = 0> {
    deque: &'a Deque<T, A, BUF>,
    pos: Position,
}

impl<'a, T, A: RawAlloc, const BUF: usize> Cursor<'a, T, A, BUF> {
    #[inline(always)]
    pub(crate) fn new(deque: &'a Deque<T, A, BUF>, pos: Position) -> Self {
        Self { deque, pos }
    }

    /// The raw position, stable across cursor copies.
    #[inline(always)]
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Logical index relative to the deque's current front.
    ///
    /// Negative before the front; `len()` at the end.
    #[inline]
    pub fn index(&self) -> isize {
        self.pos.distance(self.deque.start, Deque::<T, A, BUF>::BUFFER_SIZE)
    }

    /// The element under the cursor, or `None` outside `[begin, end)`.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.deque.get_at_position(self.pos)
    }

    /// The element `n` steps away, or `None` if that lies outside the deque.
    #[inline]
    pub fn at(&self, n: isize) -> Option<&'a T> {
        (*self + n).get()
    }

    /// Steps forward one element.
    #[inline]
    pub fn move_next(&mut self) {
        self.pos = self.pos.next(Deque::<T, A, BUF>::BUFFER_SIZE);
    }

    /// Steps back one element.
    #[inline]
    pub fn move_prev(&mut self) {
        self.pos = self.pos.prev(Deque::<T, A, BUF>::BUFFER_SIZE);
    }

    #[inline(always)]
    fn same_deque(&self, other: &Self) -> bool {
        ptr::eq(self.deque, other.deque)
    }
}

impl<T, A: RawAlloc, const BUF: usize> Clone for Cursor<'_, T, A, BUF> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: RawAlloc, const BUF: usize> Copy for Cursor<'_, T, A, BUF> {}

impl<T, A: RawAlloc, const BUF: usize> PartialEq for Cursor<'_, T, A, BUF> {
    fn eq(&self, other: &Self) -> bool {
        self.same_deque(other) && self.pos == other.pos
    }
}

impl<T, A: RawAlloc, const BUF: usize> Eq for Cursor<'_, T, A, BUF> {}

impl<T, A: RawAlloc, const BUF: usize> PartialOrd for Cursor<'_, T, A, BUF> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_deque(other) {
            Some(self.pos.cmp(&other.pos))
        } else {
            None
        }
    }
}

impl<T, A: RawAlloc, const BUF: usize> fmt::Debug for Cursor<'_, T, A, BUF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("node", &self.pos.node)
            .field("offset", &self.pos.offset)
            .field("index", &self.index())
            .finish()
    }
}

impl<T, A: RawAlloc, const BUF: usize> AddAssign<isize> for Cursor<'_, T, A, BUF> {
    #[inline]
    fn add_assign(&mut self, n: isize) {
        self.pos = self.pos.offset_by(n, Deque::<T, A, BUF>::BUFFER_SIZE);
    }
}

impl<T, A: RawAlloc, const BUF: usize> SubAssign<isize> for Cursor<'_, T, A, BUF> {
    #[inline]
    fn sub_assign(&mut self, n: isize) {
        *self += -n;
    }
}

impl<T, A: RawAlloc, const BUF: usize> Add<isize> for Cursor<'_, T, A, BUF> {
    type Output = Self;

    #[inline]
    fn add(mut self, n: isize) -> Self {
        self += n;
        self
    }
}

impl<T, A: RawAlloc, const BUF: usize> Sub<isize> for Cursor<'_, T, A, BUF> {
    type Output = Self;

    #[inline]
    fn sub(mut self, n: isize) -> Self {
        self -= n;
        self
    }
}

impl<T, A: RawAlloc, const BUF: usize> Sub for Cursor<'_, T, A, BUF> {
    type Output = isize;

    /// Signed distance `self - origin`.
    ///
    /// # Panics
    /// Panics in debug builds if the cursors belong to different deques.
    #[inline]
    fn sub(self, origin: Self) -> isize {
        debug_assert!(self.same_deque(&origin), "cursors of different deques");
        self.pos.distance(origin.pos, Deque::<T, A, BUF>::BUFFER_SIZE)
    }
}

impl<'a, T, A: RawAlloc, const BUF: usize> ForwardCursor for Cursor<'a, T, A, BUF> {
    type Item = &'a T;

    const CATEGORY: Category = Category::RandomAccess;

    #[inline]
    fn current(&self) -> Option<&'a T> {
        self.get()
    }

    #[inline]
    fn move_next(&mut self) {
        Cursor::move_next(self);
    }

    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn advance_by(&mut self, n: usize) {
        *self += n as isize;
    }

    #[inline]
    #[allow(clippy::cast_sign_loss)]
    fn distance_to(&self, last: &Self) -> usize {
        (*last - *self) as usize
    }
}

impl<T, A: RawAlloc, const BUF: usize> BidirectionalCursor for Cursor<'_, T, A, BUF> {
    #[inline]
    fn move_prev(&mut self) {
        Cursor::move_prev(self);
    }

    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn retreat_by(&mut self, n: usize) {
        *self -= n as isize;
    }
}

impl<T, A: RawAlloc, const BUF: usize> RandomAccessCursor for Cursor<'_, T, A, BUF> {
    #[inline]
    fn seek(&mut self, n: isize) {
        *self += n;
    }

    #[inline]
    fn offset_from(&self, origin: &Self) -> isize {
        *self - *origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{advance, category_of, distance};

    type Small = Deque<u32, Global, 4>;

    fn filled(n: u32) -> Small {
        let mut d = Small::new();
        d.extend(0..n);
        d
    }

    #[test]
    fn test_begin_end_distance() {
        let d = filled(11);
        assert_eq!(d.end() - d.begin(), 11);
        assert_eq!(d.begin() - d.end(), -11);
        assert_eq!(distance(&d.begin(), &d.end()), 11);
        assert_eq!(category_of::<Cursor<'_, u32, Global, 4>>(), Category::RandomAccess);
    }

    #[test]
    fn test_arithmetic_across_buffers() {
        let d = filled(11);
        let c = d.begin() + 5;
        assert_eq!(c.get(), Some(&5));
        assert_eq!((c - 3).get(), Some(&2));
        assert_eq!(c.at(4), Some(&9));
        assert_eq!(c.at(-5), Some(&0));
        assert_eq!(c.at(-6), None);
        assert_eq!(c.at(6), None);
        assert_eq!((d.end() - 1).get(), Some(&10));
        assert_eq!(d.end().get(), None);
    }

    #[test]
    fn test_arithmetic_after_push_front() {
        let mut d = filled(3);
        for v in 100..106 {
            d.push_front(v);
        }
        // Front now starts mid-buffer.
        let c = d.cursor(7);
        assert_eq!(c.index(), 7);
        assert_eq!(c.get(), Some(&1));
        assert_eq!((c - 7).get(), Some(&105));
        assert_eq!((c - 7).position(), d.begin().position());
    }

    #[test]
    fn test_stepping_matches_jumping() {
        let d = filled(17);
        let mut stepped = d.begin();
        for i in 0..=17isize {
            assert_eq!(stepped, d.begin() + i);
            assert_eq!(stepped.index(), i);
            stepped.move_next();
        }
        let mut c = d.end();
        c.move_prev();
        assert_eq!(c.get(), Some(&16));

        let mut generic = d.begin();
        advance(&mut generic, 9);
        assert_eq!(generic.get(), Some(&9));
        advance(&mut generic, -9);
        assert_eq!(generic, d.begin());
    }

    #[test]
    fn test_ordering_within_and_across_deques() {
        let a = filled(5);
        let b = filled(5);
        assert!(a.begin() < a.end());
        assert!(a.begin() + 2 <= a.begin() + 3);
        assert_ne!(a.begin(), b.begin());
        assert_eq!(a.begin().partial_cmp(&b.begin()), None);
    }

    #[test]
    fn test_stale_position_reads_none() {
        let mut d = filled(9);
        let pos = d.cursor(0).position();
        d.pop_front();
        assert_eq!(d.cursor_at_position(pos).get(), None);
        assert_eq!(d.cursor_at_position(pos).index(), -1);
    }
}
