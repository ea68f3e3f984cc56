//! Iterators over a [`Deque`].
//!
//! All three walk a half-open `[front, back)` position range, so they are
//! double-ended and know their exact length.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::index_map::RawSlots;
use super::position::Position;
use super::Deque;
use crate::alloc::{Global, RawAlloc};

/// Borrowing iterator, created by [`Deque::iter`].
pub struct Iter<'a, T, A: RawAlloc = Global, const BUF: usize = 0> {
    deque: &'a Deque<T, A, BUF>,
    front: Position,
    back: Position,
}

impl<'a, T, A: RawAlloc, const BUF: usize> Iter<'a, T, A, BUF> {
    pub(crate) fn new(deque: &'a Deque<T, A, BUF>, front: Position, back: Position) -> Self {
        Self { deque, front, back }
    }

    #[inline(always)]
    #[allow(clippy::cast_sign_loss)]
    fn remaining(&self) -> usize {
        self.back.distance(self.front, Deque::<T, A, BUF>::BUFFER_SIZE) as usize
    }
}

impl<T, A: RawAlloc, const BUF: usize> Clone for Iter<'_, T, A, BUF> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: fmt::Debug, A: RawAlloc, const BUF: usize> fmt::Debug for Iter<'_, T, A, BUF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T, A: RawAlloc, const BUF: usize> Iterator for Iter<'a, T, A, BUF> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = self.deque.get_at_position(self.front);
        self.front = self.front.next(Deque::<T, A, BUF>::BUFFER_SIZE);
        item
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining() {
            self.front = self.back;
            return None;
        }
        self.front = self.front.offset_by(n as isize, Deque::<T, A, BUF>::BUFFER_SIZE);
        self.next()
    }

    fn count(self) -> usize {
        self.remaining()
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T, A: RawAlloc, const BUF: usize> DoubleEndedIterator for Iter<'a, T, A, BUF> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back = self.back.prev(Deque::<T, A, BUF>::BUFFER_SIZE);
        self.deque.get_at_position(self.back)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn nth_back(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining() {
            self.back = self.front;
            return None;
        }
        self.back = self.back.offset_by(-(n as isize), Deque::<T, A, BUF>::BUFFER_SIZE);
        self.next_back()
    }
}

impl<T, A: RawAlloc, const BUF: usize> ExactSizeIterator for Iter<'_, T, A, BUF> {}
impl<T, A: RawAlloc, const BUF: usize> FusedIterator for Iter<'_, T, A, BUF> {}

/// Mutably borrowing iterator, created by [`Deque::iter_mut`].
///
/// Holds a raw view of the map instead of `&mut Deque` so that the yielded
/// references can outlive each `next` call.
pub struct IterMut<'a, T> {
    slots: RawSlots<T>,
    front: Position,
    back: Position,
    buf: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: behaves like `&'a mut [T]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(slots: RawSlots<T>, front: Position, back: Position, buf: usize) -> Self {
        Self {
            slots,
            front,
            back,
            buf,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    #[allow(clippy::cast_sign_loss)]
    fn remaining(&self) -> usize {
        self.back.distance(self.front, self.buf) as usize
    }
}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("remaining", &self.remaining()).finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: `[front, back)` lies inside the deque's live range, which the
        // `'a` borrow freezes; each position is yielded at most once.
        let item = unsafe { &mut *self.slots.element(self.front) };
        self.front = self.front.next(self.buf);
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        if n >= self.remaining() {
            self.front = self.back;
            return None;
        }
        self.front = self.front.offset_by(n as isize, self.buf);
        self.next()
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back = self.back.prev(self.buf);
        // SAFETY: as in `next`.
        Some(unsafe { &mut *self.slots.element(self.back) })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator, created by [`Deque::into_iter`].
///
/// Elements not yet yielded are dropped with the iterator.
pub struct IntoIter<T, A: RawAlloc = Global, const BUF: usize = 0> {
    deque: Deque<T, A, BUF>,
}

impl<T, A: RawAlloc, const BUF: usize> IntoIter<T, A, BUF> {
    pub(crate) fn new(deque: Deque<T, A, BUF>) -> Self {
        Self { deque }
    }

    /// The elements not yet yielded, front to back.
    pub fn as_deque(&self) -> &Deque<T, A, BUF> {
        &self.deque
    }
}

impl<T: fmt::Debug, A: RawAlloc, const BUF: usize> fmt::Debug for IntoIter<T, A, BUF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T, A: RawAlloc, const BUF: usize> Iterator for IntoIter<T, A, BUF> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.deque.len();
        (n, Some(n))
    }
}

impl<T, A: RawAlloc, const BUF: usize> DoubleEndedIterator for IntoIter<T, A, BUF> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, A: RawAlloc, const BUF: usize> ExactSizeIterator for IntoIter<T, A, BUF> {}
impl<T, A: RawAlloc, const BUF: usize> FusedIterator for IntoIter<T, A, BUF> {}

#[cfg(test)]
mod tests {
    use super::*;

    type Small = Deque<i32, Global, 4>;

    #[test]
    fn test_iter_both_ends() {
        let d: Small = (0..10).collect();
        let mut it = d.iter();
        assert_eq!(it.len(), 10);
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&9));
        assert_eq!(it.len(), 8);
        assert_eq!(it.nth(3), Some(&4));
        assert_eq!(it.nth_back(2), Some(&6));
        assert_eq!(it.clone().collect::<Vec<_>>(), vec![&5]);
        assert_eq!(it.next(), Some(&5));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn test_iter_nth_past_end() {
        let d: Small = (0..6).collect();
        let mut it = d.iter();
        assert_eq!(it.nth(6), None);
        assert_eq!(it.len(), 0);
        assert_eq!(d.iter().last(), Some(&5));
        assert_eq!(d.iter().count(), 6);
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut d: Small = (0..9).collect();
        d.push_front(-1);
        for v in d.iter_mut() {
            *v *= 10;
        }
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), vec![-10, 0, 10, 20, 30, 40, 50, 60, 70, 80]);

        let mut it = d.iter_mut();
        let first = it.next().unwrap();
        let last = it.next_back().unwrap();
        std::mem::swap(first, last);
        assert_eq!(d.front(), Some(&80));
        assert_eq!(d.back(), Some(&-10));
    }

    #[test]
    fn test_into_iter_drops_remainder() {
        use std::rc::Rc;

        let token = Rc::new(());
        let d: Deque<Rc<()>, Global, 4> = (0..10).map(|_| Rc::clone(&token)).collect();
        let mut it = d.into_iter();
        assert_eq!(it.len(), 10);
        drop(it.next());
        drop(it.next_back());
        assert_eq!(it.as_deque().len(), 8);
        assert_eq!(Rc::strong_count(&token), 9);
        drop(it);
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn test_into_iter_reverse() {
        let d: Small = (0..7).collect();
        assert_eq!(d.into_iter().rev().collect::<Vec<_>>(), vec![6, 5, 4, 3, 2, 1, 0]);
    }
}
