//! The map: a resizable array of owning buffer handles.
//!
//! Memory layout:
//! - one map block of `capacity` slots, each an `Option<Buffer<T>>`
//! - one element buffer of `buffer_len` slots per `Some` handle
//!
//! Both kinds of block come from the map's allocator. A [`Buffer`] is a
//! move-only handle: it enters the map through [`IndexMap::allocate_buffer`]
//! and leaves through [`IndexMap::release_buffer`], so a buffer can be neither
//! forgotten nor freed twice. The map never touches the elements inside a
//! buffer; initializing and dropping them is the deque's job.

use core::marker::PhantomData;
use core::ptr::NonNull;
use core::slice;

use super::position::Position;
use crate::alloc::{AllocError, RawAlloc};

/// Smallest map the deque ever allocates.
pub(crate) const MIN_MAP_CAPACITY: usize = 8;

/// Owning handle to one element buffer.
///
/// Not `Clone`/`Copy`: moving the handle moves ownership of the buffer.
#[repr(transparent)]
pub(crate) struct Buffer<T> {
    ptr: NonNull<T>,
}

impl<T> Buffer<T> {
    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

type Slot<T> = Option<Buffer<T>>;

// An empty slot is the null pointer niche.
const _: () = assert!(core::mem::size_of::<Slot<u64>>() == core::mem::size_of::<usize>());

/// Copyable, unowned view of a map's slot array.
///
/// Iterators that hand out references with their own lifetime keep one of
/// these instead of a borrow of the map. Valid until the map is reallocated
/// or dropped.
pub(crate) struct RawSlots<T> {
    slots: NonNull<Slot<T>>,
}

impl<T> Clone for RawSlots<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSlots<T> {}

impl<T> RawSlots<T> {
    /// Element pointer for `pos`.
    ///
    /// # Safety
    /// `pos.node` must be in bounds of the block and hold a buffer, and
    /// `pos.offset` must be below the buffer length.
    #[inline(always)]
    pub(crate) unsafe fn element(self, pos: Position) -> *mut T {
        match &*self.slots.as_ptr().add(pos.node) {
            Some(buffer) => buffer.as_ptr().add(pos.offset),
            None => {
                debug_assert!(false, "no buffer at node {}", pos.node);
                core::hint::unreachable_unchecked()
            }
        }
    }
}

pub(crate) struct IndexMap<T, A: RawAlloc> {
    slots: NonNull<Slot<T>>,
    capacity: usize,
    buffer_len: usize,
    alloc: A,
    _marker: PhantomData<Slot<T>>,
}

impl<T, A: RawAlloc> IndexMap<T, A> {
    /// Allocates a map with room for `num_nodes` live buffers plus slack and
    /// allocates those buffers, centred in the block.
    ///
    /// Returns the map and the node of the first buffer. On failure every
    /// block acquired so far is released.
    pub(crate) fn with_nodes(
        alloc: A,
        buffer_len: usize,
        num_nodes: usize,
    ) -> Result<(Self, usize), AllocError> {
        debug_assert!(buffer_len > 0 && num_nodes > 0);
        let capacity = MIN_MAP_CAPACITY.max(
            num_nodes
                .checked_add(2)
                .ok_or(AllocError::CapacityOverflow)?,
        );
        let slots = Self::allocate_block(&alloc, capacity)?;
        let mut map = Self {
            slots,
            capacity,
            buffer_len,
            alloc,
            _marker: PhantomData,
        };

        let start_node = (capacity - num_nodes) / 2;
        for node in start_node..start_node + num_nodes {
            // On error `map` is dropped here, releasing the buffers already
            // allocated and the block.
            map.allocate_buffer(node)?;
        }
        Ok((map, start_node))
    }

    fn allocate_block(alloc: &A, capacity: usize) -> Result<NonNull<Slot<T>>, AllocError> {
        let block = alloc.allocate_array::<Slot<T>>(capacity)?;
        for i in 0..capacity {
            // SAFETY: `i < capacity`; the block is fresh and uninitialized.
            unsafe { block.as_ptr().add(i).write(None) };
        }
        Ok(block)
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline(always)]
    fn slots(&self) -> &[Slot<T>] {
        // SAFETY: the block holds `capacity` initialized slots.
        unsafe { slice::from_raw_parts(self.slots.as_ptr(), self.capacity) }
    }

    #[inline(always)]
    fn slots_mut(&mut self) -> &mut [Slot<T>] {
        // SAFETY: as above, and `&mut self` makes the access exclusive.
        unsafe { slice::from_raw_parts_mut(self.slots.as_ptr(), self.capacity) }
    }

    #[inline(always)]
    pub(crate) fn raw_slots(&self) -> RawSlots<T> {
        RawSlots { slots: self.slots }
    }

    /// Number of buffers currently held.
    pub(crate) fn buffer_count(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns the element pointer of the buffer at `node`.
    ///
    /// # Safety
    /// `node < capacity` and the slot must hold a buffer.
    #[inline(always)]
    pub(crate) unsafe fn buffer(&self, node: usize) -> *mut T {
        debug_assert!(node < self.capacity);
        self.raw_slots().element(Position::new(node, 0))
    }

    /// Element pointer for a position whose node holds a buffer.
    ///
    /// # Safety
    /// As for [`IndexMap::buffer`], and `pos.offset < buffer_len`.
    #[inline(always)]
    pub(crate) unsafe fn slot_ptr(&self, pos: Position) -> *mut T {
        debug_assert!(pos.node < self.capacity && pos.offset < self.buffer_len);
        self.raw_slots().element(pos)
    }

    /// Gives the empty slot `node` a buffer.
    pub(crate) fn allocate_buffer(&mut self, node: usize) -> Result<(), AllocError> {
        debug_assert!(self.slots()[node].is_none(), "node {node} already holds a buffer");
        let ptr = self.alloc.allocate_array::<T>(self.buffer_len).map_err(|err| {
            trace_event!(node, buffer_len = self.buffer_len, "buffer allocation failed");
            err
        })?;
        self.slots_mut()[node] = Some(Buffer { ptr });
        Ok(())
    }

    /// Frees the buffer at `node`. Any values still inside it are leaked.
    pub(crate) fn release_buffer(&mut self, node: usize) {
        if let Some(buffer) = self.slots_mut()[node].take() {
            // SAFETY: every handle was produced by `allocate_array(buffer_len)`
            // on this allocator, and taking it out of the slot ends its use.
            unsafe { self.alloc.deallocate_array(buffer.ptr, self.buffer_len) };
        }
    }

    /// Makes sure `nodes_to_add` slots are free after `finish`'s node.
    pub(crate) fn reserve_at_back(
        &mut self,
        start: &mut Position,
        finish: &mut Position,
        nodes_to_add: usize,
    ) -> Result<(), AllocError> {
        if nodes_to_add + 1 > self.capacity - finish.node {
            self.reallocate(start, finish, nodes_to_add, false)?;
        }
        Ok(())
    }

    /// Makes sure `nodes_to_add` slots are free before `start`'s node.
    pub(crate) fn reserve_at_front(
        &mut self,
        start: &mut Position,
        finish: &mut Position,
        nodes_to_add: usize,
    ) -> Result<(), AllocError> {
        if nodes_to_add > start.node {
            self.reallocate(start, finish, nodes_to_add, true)?;
        }
        Ok(())
    }

    /// Recentres the live handles in place when the block is more than twice
    /// the needed size, otherwise moves them into a larger block.
    ///
    /// Only node indices of `start`/`finish` change; offsets stay. If the new
    /// block cannot be allocated nothing is modified.
    fn reallocate(
        &mut self,
        start: &mut Position,
        finish: &mut Position,
        nodes_to_add: usize,
        add_at_front: bool,
    ) -> Result<(), AllocError> {
        let old_nodes = finish.node - start.node + 1;
        let new_nodes = old_nodes
            .checked_add(nodes_to_add)
            .ok_or(AllocError::CapacityOverflow)?;
        let front_slack = if add_at_front { nodes_to_add } else { 0 };

        let new_start = if self.capacity > 2 * new_nodes {
            let new_start = (self.capacity - new_nodes) / 2 + front_slack;
            let old_start = start.node;
            let slots = self.slots_mut();
            if new_start < old_start {
                for i in 0..old_nodes {
                    slots[new_start + i] = slots[old_start + i].take();
                }
            } else {
                for i in (0..old_nodes).rev() {
                    slots[new_start + i] = slots[old_start + i].take();
                }
            }
            trace_event!(
                capacity = self.capacity,
                live = old_nodes,
                from = old_start,
                to = new_start,
                "map recentred"
            );
            new_start
        } else {
            let new_capacity = self
                .capacity
                .checked_add(self.capacity.max(nodes_to_add))
                .and_then(|n| n.checked_add(2))
                .ok_or(AllocError::CapacityOverflow)?;
            let new_block = Self::allocate_block(&self.alloc, new_capacity).map_err(|err| {
                trace_event!(new_capacity, "map growth failed");
                err
            })?;
            let new_start = (new_capacity - new_nodes) / 2 + front_slack;
            for i in 0..old_nodes {
                // SAFETY: both indices are in bounds of their blocks; the old slot
                // is left `None`, so ownership of the handle moves exactly once.
                unsafe {
                    let handle = (*self.slots.as_ptr().add(start.node + i)).take();
                    *new_block.as_ptr().add(new_start + i) = handle;
                }
            }
            // SAFETY: the old block holds only `None` now and was allocated
            // with `capacity` slots.
            unsafe { self.alloc.deallocate_array(self.slots, self.capacity) };
            trace_event!(
                old_capacity = self.capacity,
                new_capacity,
                live = old_nodes,
                "map grown"
            );
            self.slots = new_block;
            self.capacity = new_capacity;
            new_start
        };

        start.node = new_start;
        finish.node = new_start + old_nodes - 1;
        Ok(())
    }
}

impl<T, A: RawAlloc> Drop for IndexMap<T, A> {
    fn drop(&mut self) {
        for node in 0..self.capacity {
            self.release_buffer(node);
        }
        // SAFETY: `Option<Buffer<T>>` has no drop glue; the block came from
        // `allocate_array(capacity)`.
        unsafe { self.alloc.deallocate_array(self.slots, self.capacity) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Global;

    fn live_nodes<T, A: RawAlloc>(map: &IndexMap<T, A>) -> Vec<usize> {
        map.slots()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect()
    }

    #[test]
    fn test_with_nodes_centres_buffers() {
        let (map, start) = IndexMap::<u32, _>::with_nodes(Global, 4, 1).unwrap();
        assert_eq!(map.capacity(), MIN_MAP_CAPACITY);
        assert_eq!(start, 3);
        assert_eq!(live_nodes(&map), vec![3]);

        let (map, start) = IndexMap::<u32, _>::with_nodes(Global, 4, 10).unwrap();
        assert_eq!(map.capacity(), 12);
        assert_eq!(start, 1);
        assert_eq!(map.buffer_count(), 10);
    }

    #[test]
    fn test_reserve_at_back_recentres_in_place() {
        let (mut map, s) = IndexMap::<u32, _>::with_nodes(Global, 4, 1).unwrap();
        let mut start = Position::new(s, 0);
        let mut finish = Position::new(s, 2);
        // Walk the live range to the last slot so the back has no slack left.
        for node in s + 1..map.capacity() {
            map.allocate_buffer(node).unwrap();
            map.release_buffer(node - 1);
        }
        start.node = map.capacity() - 1;
        finish.node = map.capacity() - 1;
        let marker = unsafe { map.buffer(start.node) };

        map.reserve_at_back(&mut start, &mut finish, 1).unwrap();
        assert_eq!(map.capacity(), MIN_MAP_CAPACITY);
        assert_eq!(start.node, (MIN_MAP_CAPACITY - 2) / 2);
        assert_eq!(finish.node, start.node);
        assert_eq!(finish.offset, 2);
        assert_eq!(unsafe { map.buffer(start.node) }, marker);
        assert_eq!(live_nodes(&map), vec![start.node]);
    }

    #[test]
    fn test_reserve_at_front_grows_block() {
        let (mut map, s) = IndexMap::<u32, _>::with_nodes(Global, 4, 6).unwrap();
        assert_eq!(map.capacity(), 8);
        assert_eq!(s, 1);
        let mut start = Position::new(s, 1);
        let mut finish = Position::new(s + 5, 3);
        let first = unsafe { map.buffer(start.node) };

        map.reserve_at_front(&mut start, &mut finish, 2).unwrap();
        // 8 + max(8, 2) + 2
        assert_eq!(map.capacity(), 18);
        assert_eq!(start.node, (18 - 8) / 2 + 2);
        assert_eq!(finish.node, start.node + 5);
        assert_eq!(start.offset, 1);
        assert_eq!(unsafe { map.buffer(start.node) }, first);
        assert_eq!(map.buffer_count(), 6);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let (mut map, s) = IndexMap::<u64, _>::with_nodes(Global, 8, 2).unwrap();
        map.release_buffer(s + 1);
        map.release_buffer(s + 1);
        assert_eq!(live_nodes(&map), vec![s]);
    }
}
