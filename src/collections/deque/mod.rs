//! `Deque` - a double-ended queue stored in fixed-size buffers.
//!
//! Elements live in equally sized buffers. A map of owning buffer handles
//! records which buffers exist; the live elements run from the `start`
//! position in the first live buffer to the `finish` position in the last.
//! Growing at either end allocates one buffer at a time and never moves an
//! existing element, so references into untouched buffers stay put and no
//! operation ever copies the whole sequence.
//!
//! ## Performance Characteristics
//!
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `push_front` / `push_back` | \(O(1)\) amortized | one buffer allocation per `buffer_size` pushes |
//! | `pop_front` / `pop_back` | \(O(1)\) | frees a buffer when it empties |
//! | `get` / `Index` | \(O(1)\) | position arithmetic, no search |
//! | `insert` / `remove` | \(O(\min(i, n - i))\) | shifts the shorter side |
//! | `erase(range)` | \(O(\min(before, after) + k)\) | |
//! | `clear` | \(O(n)\) | keeps one buffer allocated |
//!
//! ## Buffer size
//!
//! `BUF` picks the number of elements per buffer. `0` (the default) sizes
//! buffers to roughly 512 bytes: `512 / size_of::<T>()` slots for elements
//! smaller than 512 bytes, a single slot otherwise.
//!
//! ```rust
//! use segdeque::Deque;
//!
//! let mut deque: Deque<i32> = Deque::new();
//! deque.push_back(2);
//! deque.push_back(3);
//! deque.push_front(1);
//! assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//!
//! deque.insert(1, 10);
//! assert_eq!(deque[1], 10);
//! assert_eq!(deque.remove(1), Some(10));
//! ```

use core::convert::Infallible;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Bound, Index, IndexMut, Range, RangeBounds};
use core::ptr::{self, NonNull};

use crate::alloc::{construct, destroy_range, AllocError, Global, RawAlloc, ScopedInit};

mod cursor;
mod error;
mod index_map;
mod iter;
mod position;
mod serde;

pub use cursor::Cursor;
pub use error::{BoundsError, DequeError};
pub use iter::{IntoIter, Iter, IterMut};
pub use position::Position;

use index_map::IndexMap;

/// Target size in bytes of an automatically sized buffer.
pub const DEFAULT_BUFFER_BYTES: usize = 512;

/// Number of elements per buffer for a configured size and an element size.
///
/// A non-zero `configured` size wins. Otherwise elements smaller than
/// [`DEFAULT_BUFFER_BYTES`] get `DEFAULT_BUFFER_BYTES / elem_size` slots and
/// larger ones get a single slot. Zero-sized elements count as one byte.
pub const fn buffer_size(configured: usize, elem_size: usize) -> usize {
    if configured != 0 {
        configured
    } else if elem_size == 0 {
        DEFAULT_BUFFER_BYTES
    } else if elem_size < DEFAULT_BUFFER_BYTES {
        DEFAULT_BUFFER_BYTES / elem_size
    } else {
        1
    }
}

/// A double-ended queue backed by a map of fixed-size buffers.
///
/// # Type Parameters
/// - `T`: The element type
/// - `A`: The allocator for buffers and the map
/// - `BUF`: Elements per buffer, `0` for automatic sizing
///
/// `finish` always addresses a slot inside an allocated buffer, so the deque
/// holds at least one buffer for its whole life.
pub struct Deque<T, A: RawAlloc = Global, const BUF: usize = 0> {
    map: IndexMap<T, A>,
    start: Position,
    finish: Position,
    _marker: PhantomData<T>,
}

// SAFETY: the deque uniquely owns its buffers and elements, like `Vec`.
unsafe impl<T: Send, A: RawAlloc + Send, const BUF: usize> Send for Deque<T, A, BUF> {}
// SAFETY: shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: RawAlloc + Sync, const BUF: usize> Sync for Deque<T, A, BUF> {}

impl<T, const BUF: usize> Deque<T, Global, BUF> {
    /// Creates an empty deque with one buffer allocated.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a deque holding `n` clones of `value`.
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(n, value, Global)
    }
}

impl<T, A: RawAlloc, const BUF: usize> Deque<T, A, BUF> {
    /// Elements per buffer for this instantiation.
    pub const BUFFER_SIZE: usize = buffer_size(BUF, mem::size_of::<T>());

    /// Creates an empty deque using `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::try_new_in(alloc).unwrap_or_else(|err| err.handle())
    }

    /// Creates an empty deque using `alloc`, reporting allocation failure.
    ///
    /// # Errors
    /// Returns the allocator's error if the map or the first buffer cannot be
    /// allocated; nothing is leaked.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        let (map, node) = IndexMap::with_nodes(alloc, Self::BUFFER_SIZE, 1)?;
        let start = Position::new(node, 0);
        Ok(Self {
            map,
            start,
            finish: start,
            _marker: PhantomData,
        })
    }

    /// Creates a deque holding `n` clones of `value`, using `alloc`.
    pub fn from_elem_in(n: usize, value: T, alloc: A) -> Self
    where
        T: Clone,
    {
        Self::try_from_fn_in(n, alloc, |_| Ok::<_, Infallible>(value.clone()))
            .unwrap_or_else(|err| err.into_alloc().handle())
    }

    /// Creates a deque of `n` elements produced by `f(index)`.
    ///
    /// The map and all buffers are sized for exactly `n` elements up front.
    ///
    /// # Errors
    /// - [`DequeError::Alloc`] if the map or a buffer cannot be allocated.
    /// - [`DequeError::Construct`] with the first error returned by `f`.
    ///
    /// In both cases every element built so far is dropped and every block
    /// acquired is released.
    pub fn try_from_fn_in<E, F>(n: usize, alloc: A, mut f: F) -> Result<Self, DequeError<E>>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let buf = Self::BUFFER_SIZE;
        let num_nodes = (n / buf).checked_add(1).ok_or(AllocError::CapacityOverflow)?;
        let (map, first) = IndexMap::with_nodes(alloc, buf, num_nodes)?;
        trace_event!(len = n, nodes = num_nodes, map_capacity = map.capacity(), "fill construct");

        // Until the loop ends the deque owns exactly `[start, finish)`;
        // dropping it on error cleans up the finished buffers.
        let start = Position::new(first, 0);
        let mut deque = Self {
            map,
            start,
            finish: start,
            _marker: PhantomData,
        };

        let last = first + num_nodes - 1;
        let mut index = 0;
        for node in first..=last {
            let count = if node == last { n % buf } else { buf };
            // SAFETY: `with_nodes` allocated a buffer of `buf` uninitialized slots at `node`.
            let base = unsafe { NonNull::new_unchecked(deque.map.buffer(node)) };
            // SAFETY: `count <= buf` and the slots are vacant.
            let mut guard = unsafe { ScopedInit::new(base, count) };
            guard
                .fill_with(|i| f(index + i))
                .map_err(DequeError::Construct)?;
            guard.finish();
            index += count;
            deque.finish = if count == buf {
                Position::new(node + 1, 0)
            } else {
                Position::new(node, count)
            };
        }
        Ok(deque)
    }

    /// Returns the allocator.
    #[inline(always)]
    pub fn allocator(&self) -> &A {
        self.map.allocator()
    }

    /// Elements per buffer.
    #[inline(always)]
    pub const fn buffer_size(&self) -> usize {
        Self::BUFFER_SIZE
    }

    /// Number of buffers currently allocated.
    pub fn buffer_count(&self) -> usize {
        self.map.buffer_count()
    }

    /// Number of slots in the map.
    #[inline(always)]
    pub fn map_capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Number of elements.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub fn len(&self) -> usize {
        self.finish.distance(self.start, Self::BUFFER_SIZE) as usize
    }

    /// Returns `true` if the deque holds no elements.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.start == self.finish
    }

    #[inline(always)]
    #[allow(clippy::cast_possible_wrap)]
    fn position_of(&self, index: usize) -> Position {
        self.start.offset_by(index as isize, Self::BUFFER_SIZE)
    }

    /// Returns `true` if `pos` addresses a live element.
    #[inline(always)]
    pub fn contains_position(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.finish
    }

    /// Cursor at the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T, A, BUF> {
        Cursor::new(self, self.start)
    }

    /// Cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'_, T, A, BUF> {
        Cursor::new(self, self.finish)
    }

    /// Cursor at logical `index`; `index == len()` gives [`Deque::end`].
    #[inline]
    pub fn cursor(&self, index: usize) -> Cursor<'_, T, A, BUF> {
        Cursor::new(self, self.position_of(index))
    }

    /// Cursor at a position obtained earlier, e.g. from [`Cursor::position`].
    ///
    /// The position is re-validated on every read, so a stale one yields
    /// `None` rather than touching freed memory.
    #[inline]
    pub fn cursor_at_position(&self, pos: Position) -> Cursor<'_, T, A, BUF> {
        Cursor::new(self, pos)
    }

    /// Reference to the element at `pos`, if it is live.
    #[inline]
    pub(crate) fn get_at_position(&self, pos: Position) -> Option<&T> {
        if self.contains_position(pos) {
            // SAFETY: live positions address initialized slots in allocated buffers.
            Some(unsafe { &*self.map.slot_ptr(pos) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `index`, if in bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked(index) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, if in bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `index` without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.map.slot_ptr(self.position_of(index))
    }

    /// Returns a mutable reference to the element at `index` without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.map.slot_ptr(self.position_of(index))
    }

    /// Bounds-checked access that reports the failing index.
    ///
    /// # Errors
    /// Returns [`BoundsError`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, BoundsError> {
        let len = self.len();
        self.get(index).ok_or(BoundsError { index, len })
    }

    /// Mutable counterpart of [`Deque::at`].
    ///
    /// # Errors
    /// Returns [`BoundsError`] if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, BoundsError> {
        let len = self.len();
        self.get_mut(index).ok_or(BoundsError { index, len })
    }

    /// First element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get_at_position(self.start)
    }

    /// Last element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.get_at_position(self.finish.prev(Self::BUFFER_SIZE))
    }

    /// Mutable first element.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Mutable last element.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len().checked_sub(1)?;
        self.get_mut(last)
    }

    /// Appends an element.
    ///
    /// # Panics
    /// Diverges through [`AllocError::handle`] if a buffer or a larger map
    /// cannot be allocated.
    #[inline]
    pub fn push_back(&mut self, value: T) {
        self.try_push_back(value).unwrap_or_else(|err| err.handle());
    }

    /// Prepends an element.
    ///
    /// # Panics
    /// Diverges through [`AllocError::handle`] if a buffer or a larger map
    /// cannot be allocated.
    #[inline]
    pub fn push_front(&mut self, value: T) {
        self.try_push_front(value).unwrap_or_else(|err| err.handle());
    }

    /// Appends an element, reporting allocation failure.
    ///
    /// # Errors
    /// On allocation failure `value` is dropped and the deque is unchanged.
    #[inline]
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        self.try_push_back_with(|| Ok(value))
            .map_err(DequeError::into_alloc)
    }

    /// Prepends an element, reporting allocation failure.
    ///
    /// # Errors
    /// On allocation failure `value` is dropped and the deque is unchanged.
    #[inline]
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        self.try_push_front_with(|| Ok(value))
            .map_err(DequeError::into_alloc)
    }

    /// Appends the element produced by `f`.
    ///
    /// When the back buffer is full, the next buffer is allocated before `f`
    /// runs; if `f` then fails or panics the new buffer is released again.
    ///
    /// # Errors
    /// [`DequeError::Alloc`] or [`DequeError::Construct`]; the deque is
    /// unchanged in both cases.
    pub fn try_push_back_with<E, F>(&mut self, f: F) -> Result<(), DequeError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let buf = Self::BUFFER_SIZE;
        if self.finish.offset + 1 < buf {
            let value = f().map_err(DequeError::Construct)?;
            // SAFETY: `finish` is a vacant slot inside an allocated buffer.
            unsafe { construct(self.map.slot_ptr(self.finish), value) };
            self.finish.offset += 1;
            return Ok(());
        }

        self.map.reserve_at_back(&mut self.start, &mut self.finish, 1)?;
        let next = self.finish.node + 1;
        self.map.allocate_buffer(next)?;
        // Releases the new buffer if `f` fails or unwinds.
        let mut pending = ReleaseOnDrop {
            map: &mut self.map,
            nodes: next..next + 1,
        };
        let value = f().map_err(DequeError::Construct)?;
        pending.nodes = next..next;
        // SAFETY: as above; the last slot of the back buffer is vacant.
        unsafe { construct(pending.map.slot_ptr(self.finish), value) };
        self.finish = Position::new(next, 0);
        Ok(())
    }

    /// Prepends the element produced by `f`.
    ///
    /// When the front buffer is full, the previous buffer is allocated before
    /// `f` runs; if `f` then fails or panics the new buffer is released again.
    ///
    /// # Errors
    /// [`DequeError::Alloc`] or [`DequeError::Construct`]; the deque is
    /// unchanged in both cases.
    pub fn try_push_front_with<E, F>(&mut self, f: F) -> Result<(), DequeError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let buf = Self::BUFFER_SIZE;
        if self.start.offset != 0 {
            let value = f().map_err(DequeError::Construct)?;
            let pos = Position::new(self.start.node, self.start.offset - 1);
            // SAFETY: slots before `start` in its buffer are vacant.
            unsafe { construct(self.map.slot_ptr(pos), value) };
            self.start = pos;
            return Ok(());
        }

        self.map.reserve_at_front(&mut self.start, &mut self.finish, 1)?;
        let prev = self.start.node - 1;
        self.map.allocate_buffer(prev)?;
        let mut pending = ReleaseOnDrop {
            map: &mut self.map,
            nodes: prev..prev + 1,
        };
        let value = f().map_err(DequeError::Construct)?;
        pending.nodes = prev..prev;
        let pos = Position::new(prev, buf - 1);
        // SAFETY: the buffer at `prev` was just allocated.
        unsafe { construct(pending.map.slot_ptr(pos), value) };
        self.start = pos;
        Ok(())
    }

    /// Removes the first element and returns it.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the deque is non-empty, so `start` is live; `shrink_front`
        // stops tracking the slot we move out of.
        let value = unsafe { self.map.slot_ptr(self.start).read() };
        self.shrink_front();
        Some(value)
    }

    /// Removes the last element and returns it.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.shrink_back();
        // SAFETY: after shrinking, `finish` is the former last element, now untracked.
        Some(unsafe { self.map.slot_ptr(self.finish).read() })
    }

    /// Advances `start` past a vacated slot, freeing its buffer if it emptied.
    fn shrink_front(&mut self) {
        if self.start.offset + 1 == Self::BUFFER_SIZE {
            self.map.release_buffer(self.start.node);
            self.start = Position::new(self.start.node + 1, 0);
        } else {
            self.start.offset += 1;
        }
    }

    /// Retreats `finish` by one slot, freeing the finish buffer if it was empty.
    fn shrink_back(&mut self) {
        if self.finish.offset == 0 {
            self.map.release_buffer(self.finish.node);
            self.finish = Position::new(self.finish.node - 1, Self::BUFFER_SIZE - 1);
        } else {
            self.finish.offset -= 1;
        }
    }

    /// Opens a vacant slot before the first element.
    fn grow_front(&mut self) -> Result<(), AllocError> {
        if self.start.offset == 0 {
            self.map.reserve_at_front(&mut self.start, &mut self.finish, 1)?;
            let prev = self.start.node - 1;
            self.map.allocate_buffer(prev)?;
            self.start = Position::new(prev, Self::BUFFER_SIZE - 1);
        } else {
            self.start.offset -= 1;
        }
        Ok(())
    }

    /// Takes the vacant `finish` slot into the live range.
    fn grow_back(&mut self) -> Result<(), AllocError> {
        if self.finish.offset + 1 == Self::BUFFER_SIZE {
            self.map.reserve_at_back(&mut self.start, &mut self.finish, 1)?;
            let next = self.finish.node + 1;
            self.map.allocate_buffer(next)?;
            self.finish = Position::new(next, 0);
        } else {
            self.finish.offset += 1;
        }
        Ok(())
    }

    /// Moves `count` elements one slot toward the back, walking backward from `dst`.
    ///
    /// # Safety
    /// `dst` must be vacant and the `count` slots before it initialized.
    /// Leaves the first of those slots vacant and returns its position.
    unsafe fn shift_toward_back(&mut self, mut dst: Position, count: usize) -> Position {
        let buf = Self::BUFFER_SIZE;
        for _ in 0..count {
            let src = dst.prev(buf);
            ptr::copy_nonoverlapping(self.map.slot_ptr(src), self.map.slot_ptr(dst), 1);
            dst = src;
        }
        dst
    }

    /// Moves `count` elements one slot toward the front, walking forward from `dst`.
    ///
    /// # Safety
    /// `dst` must be vacant and the `count` slots after it initialized.
    /// Leaves the last of those slots vacant and returns its position.
    unsafe fn shift_toward_front(&mut self, mut dst: Position, count: usize) -> Position {
        let buf = Self::BUFFER_SIZE;
        for _ in 0..count {
            let src = dst.next(buf);
            ptr::copy_nonoverlapping(self.map.slot_ptr(src), self.map.slot_ptr(dst), 1);
            dst = src;
        }
        dst
    }

    /// Inserts `value` so that it ends up at logical `index`.
    ///
    /// # Panics
    /// Panics if `index > len()`; diverges through [`AllocError::handle`] if
    /// the deque cannot grow.
    pub fn insert(&mut self, index: usize, value: T) {
        self.try_insert(index, value).unwrap_or_else(|err| err.handle());
    }

    /// Inserts `value` at `index`, reporting allocation failure.
    ///
    /// Shifts whichever side of `index` is shorter.
    ///
    /// # Errors
    /// On allocation failure `value` is dropped and the deque is unchanged.
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), AllocError> {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        if index == 0 {
            return self.try_push_front(value);
        }
        if index == len {
            return self.try_push_back(value);
        }

        let hole = if index < len / 2 {
            self.grow_front()?;
            // SAFETY: `start` is the vacant slot just opened, followed by `len` live slots.
            unsafe { self.shift_toward_front(self.start, index) }
        } else {
            self.grow_back()?;
            // Growing may move the map, so read the opened slot back from `finish`.
            let vacant = self.finish.prev(Self::BUFFER_SIZE);
            // SAFETY: `vacant` is the slot just taken into the range, preceded by `len` live slots.
            unsafe { self.shift_toward_back(vacant, len - index) }
        };
        // SAFETY: the shift left exactly `hole` vacant, at logical `index`.
        unsafe { construct(self.map.slot_ptr(hole), value) };
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting the shorter side.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let pos = self.position_of(index);
        // SAFETY: `index < len`; the slot is refilled or untracked below.
        let value = unsafe { self.map.slot_ptr(pos).read() };
        if index < len / 2 {
            // SAFETY: `pos` is vacant and preceded by `index` live slots.
            unsafe { self.shift_toward_back(pos, index) };
            self.shrink_front();
        } else {
            // SAFETY: `pos` is vacant and followed by `len - index - 1` live slots.
            unsafe { self.shift_toward_front(pos, len - index - 1) };
            self.shrink_back();
        }
        Some(value)
    }

    /// Drops the elements in `range`, closing the gap from the shorter side.
    ///
    /// Buffers that end up entirely outside the live range are freed.
    ///
    /// # Panics
    /// Panics if the range is decreasing or ends past `len()`.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let len = self.len();
        let Range { start: first, end: last } = resolve_range(range, len);
        let n = last - first;
        if n == 0 {
            return;
        }
        if n == len {
            self.clear();
            return;
        }

        let buf = Self::BUFFER_SIZE;
        #[allow(clippy::cast_possible_wrap)]
        let shift = n as isize;
        // `n < len` here, so `len - n` cannot wrap.
        if first < (len - n) / 2 {
            // Rotate the removed run to the front: element `i` trades places
            // with `i + n`, walking down from `first - 1`.
            let mut low = self.position_of(first).prev(buf);
            let mut high = low.offset_by(shift, buf);
            for _ in 0..first {
                // SAFETY: both positions are live and distinct.
                unsafe { ptr::swap(self.map.slot_ptr(low), self.map.slot_ptr(high)) };
                low = low.prev(buf);
                high = high.prev(buf);
            }
            let old_start = self.start;
            let new_start = old_start.offset_by(shift, buf);
            self.start = new_start;
            // SAFETY: `[old_start, new_start)` holds the removed values, no longer tracked.
            unsafe { self.discard(old_start, new_start, old_start.node..new_start.node) };
        } else {
            let mut low = self.position_of(first);
            let mut high = low.offset_by(shift, buf);
            for _ in last..len {
                // SAFETY: both positions are live and distinct.
                unsafe { ptr::swap(self.map.slot_ptr(low), self.map.slot_ptr(high)) };
                low = low.next(buf);
                high = high.next(buf);
            }
            let old_finish = self.finish;
            let new_finish = old_finish.offset_by(-shift, buf);
            self.finish = new_finish;
            // SAFETY: `[new_finish, old_finish)` holds the removed values, no longer tracked.
            unsafe {
                self.discard(new_finish, old_finish, new_finish.node + 1..old_finish.node + 1);
            }
        }
    }

    /// Drops every element and frees every buffer but the first.
    ///
    /// The remaining buffer keeps the deque ready for reuse without
    /// allocating.
    pub fn clear(&mut self) {
        let from = self.start;
        let to = self.finish;
        self.finish = from;
        // SAFETY: `[from, to)` was the live range and is no longer tracked.
        unsafe { self.discard(from, to, from.node + 1..to.node + 1) };
    }

    /// Drops the values in `[from, to)` and then releases the buffers at `nodes`.
    ///
    /// The buffers are released even if a destructor panics.
    ///
    /// # Safety
    /// `[from, to)` must be initialized slots in allocated buffers that the
    /// deque no longer counts as live, and no live element may sit in `nodes`.
    unsafe fn discard(&mut self, from: Position, to: Position, nodes: Range<usize>) {
        let guard = ReleaseOnDrop {
            map: &mut self.map,
            nodes,
        };
        if mem::needs_drop::<T>() && from != to {
            let buf = Self::BUFFER_SIZE;
            let mut node = from.node;
            let mut offset = from.offset;
            loop {
                let end = if node == to.node { to.offset } else { buf };
                if end > offset {
                    destroy_range(guard.map.buffer(node).add(offset), end - offset);
                }
                if node == to.node {
                    break;
                }
                node += 1;
                offset = 0;
            }
        }
        drop(guard);
    }

    /// Returns a front-to-back iterator.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, A, BUF> {
        Iter::new(self, self.start, self.finish)
    }

    /// Returns a front-to-back iterator of mutable references.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.map.raw_slots(), self.start, self.finish, Self::BUFFER_SIZE)
    }
}

/// Releases a run of map nodes when dropped. Emptying `nodes` disarms it.
struct ReleaseOnDrop<'a, T, A: RawAlloc> {
    map: &'a mut IndexMap<T, A>,
    nodes: Range<usize>,
}

impl<T, A: RawAlloc> Drop for ReleaseOnDrop<'_, T, A> {
    fn drop(&mut self) {
        for node in self.nodes.clone() {
            self.map.release_buffer(node);
        }
    }
}

fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n
            .checked_add(1)
            .unwrap_or_else(|| panic!("attempted to erase from after usize::MAX")),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&n) => n
            .checked_add(1)
            .unwrap_or_else(|| panic!("attempted to erase up to usize::MAX inclusive")),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    assert!(start <= end, "erase range starts at {start} but ends at {end}");
    assert!(end <= len, "erase range end {end} out of range for deque of length {len}");
    start..end
}

impl<T, A: RawAlloc, const BUF: usize> Drop for Deque<T, A, BUF> {
    fn drop(&mut self) {
        self.clear();
        // The map frees the remaining buffer and its block.
    }
}

impl<T, const BUF: usize> Default for Deque<T, Global, BUF> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: RawAlloc + Clone, const BUF: usize> Clone for Deque<T, A, BUF> {
    fn clone(&self) -> Self {
        Self::try_from_fn_in(self.len(), self.allocator().clone(), |i| {
            // SAFETY: `try_from_fn_in` only asks for `i < self.len()`.
            Ok::<_, Infallible>(unsafe { self.get_unchecked(i) }.clone())
        })
        .unwrap_or_else(|err| err.into_alloc().handle())
    }
}

impl<T: core::fmt::Debug, A: RawAlloc, const BUF: usize> core::fmt::Debug for Deque<T, A, BUF> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: RawAlloc, const BUF: usize> PartialEq for Deque<T, A, BUF> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: RawAlloc, const BUF: usize> Eq for Deque<T, A, BUF> {}

impl<T, A: RawAlloc, const BUF: usize> Index<usize> for Deque<T, A, BUF> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        let len = self.len();
        match self.get(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A: RawAlloc, const BUF: usize> IndexMut<usize> for Deque<T, A, BUF> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A: RawAlloc, const BUF: usize> Extend<T> for Deque<T, A, BUF> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a, A: RawAlloc, const BUF: usize> Extend<&'a T> for Deque<T, A, BUF> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const BUF: usize> FromIterator<T> for Deque<T, Global, BUF> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T, A: RawAlloc, const BUF: usize> IntoIterator for Deque<T, A, BUF> {
    type Item = T;
    type IntoIter = IntoIter<T, A, BUF>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: RawAlloc, const BUF: usize> IntoIterator for &'a Deque<T, A, BUF> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A, BUF>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: RawAlloc, const BUF: usize> IntoIterator for &'a mut Deque<T, A, BUF> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
