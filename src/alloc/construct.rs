//! In-place construction and destruction of values in raw storage.
//!
//! Containers obtain uninitialized blocks from a [`RawAlloc`](super::RawAlloc)
//! and place values into them with the helpers here.
//!
//! ## Core invariant
//! A slot is initialized *exactly when* a `construct` into it has returned and
//! no `destroy`/read of it has happened since. [`ScopedInit`] extends this to
//! runs of slots: while the guard is armed it owns the prefix it has
//! constructed, and it drops that prefix if it is dropped before
//! [`ScopedInit::finish`].

use core::ptr::{self, NonNull};

/// Writes `value` into the uninitialized slot `ptr`.
///
/// # Safety
/// - `ptr` must be valid for writes and properly aligned.
/// - Any value previously in the slot must already have been moved out or
///   destroyed, otherwise it leaks.
#[inline(always)]
pub unsafe fn construct<T>(ptr: *mut T, value: T) {
    // SAFETY: caller guarantees `ptr` is writable and vacant.
    unsafe { ptr.write(value) }
}

/// Drops the value at `ptr` in place, leaving the slot uninitialized.
///
/// # Safety
/// `ptr` must point to an initialized value that is not used afterwards.
#[inline(always)]
pub unsafe fn destroy<T>(ptr: *mut T) {
    // SAFETY: caller asserts `ptr` holds a live value.
    unsafe { ptr::drop_in_place(ptr) }
}

/// Drops `len` contiguous values starting at `first`.
///
/// If one destructor panics the remaining values are still dropped.
///
/// # Safety
/// `first..first + len` must all be initialized and not used afterwards.
#[inline(always)]
pub unsafe fn destroy_range<T>(first: *mut T, len: usize) {
    // SAFETY: caller asserts the run is initialized.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, len)) }
}

/// A guard that constructs values into a run of uninitialized slots.
///
/// If the guard is dropped before [`ScopedInit::finish`] (because a factory
/// returned an error or panicked) it drops exactly the values it has
/// constructed so far, leaving the storage uninitialized again. The storage
/// itself is never freed by the guard.
pub struct ScopedInit<T> {
    base: NonNull<T>,
    capacity: usize,
    initialized: usize,
}

impl<T> ScopedInit<T> {
    /// Starts a construction run over `capacity` slots at `base`.
    ///
    /// # Safety
    /// `base..base + capacity` must be valid for writes, properly aligned and
    /// uninitialized for as long as the guard lives.
    #[inline]
    pub unsafe fn new(base: NonNull<T>, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            initialized: 0,
        }
    }

    /// Number of values constructed so far.
    #[inline(always)]
    pub fn initialized(&self) -> usize {
        self.initialized
    }

    /// Constructs the next value.
    ///
    /// # Panics
    /// Panics if the run is already full.
    #[inline]
    pub fn push(&mut self, value: T) {
        assert!(self.initialized < self.capacity, "ScopedInit overflow");
        // SAFETY: `initialized < capacity`, and slots past the prefix are vacant.
        unsafe { construct(self.base.as_ptr().add(self.initialized), value) };
        self.initialized += 1;
    }

    /// Fills every remaining slot from `f`, stopping at the first error.
    ///
    /// `f` receives the slot index within this run.
    ///
    /// # Errors
    /// Propagates the first error returned by `f`; the values constructed so
    /// far stay owned by the guard.
    pub fn fill_with<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        while self.initialized < self.capacity {
            let value = f(self.initialized)?;
            self.push(value);
        }
        Ok(())
    }

    /// Disarms the guard and returns the number of constructed values, which
    /// the caller now owns.
    #[inline]
    pub fn finish(self) -> usize {
        let n = self.initialized;
        core::mem::forget(self);
        n
    }
}

impl<T> Drop for ScopedInit<T> {
    fn drop(&mut self) {
        // SAFETY: exactly the first `initialized` slots hold values owned by the guard.
        unsafe { destroy_range(self.base.as_ptr(), self.initialized) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{Global, RawAlloc};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_construct_and_destroy() {
        let drops = Rc::new(Cell::new(0));
        let ptr = Global.allocate_array::<Tracked>(3).unwrap();
        unsafe {
            for i in 0..3 {
                construct(ptr.as_ptr().add(i), Tracked(drops.clone()));
            }
            destroy(ptr.as_ptr());
            assert_eq!(drops.get(), 1);
            destroy_range(ptr.as_ptr().add(1), 2);
            assert_eq!(drops.get(), 3);
            Global.deallocate_array(ptr, 3);
        }
    }

    #[test]
    fn test_scoped_init_drops_prefix_on_error() {
        let drops = Rc::new(Cell::new(0));
        let ptr = Global.allocate_array::<Tracked>(8).unwrap();
        {
            let mut guard = unsafe { ScopedInit::new(ptr, 8) };
            let result = guard.fill_with(|i| {
                if i == 5 {
                    Err("factory failed")
                } else {
                    Ok(Tracked(drops.clone()))
                }
            });
            assert_eq!(result, Err("factory failed"));
            assert_eq!(guard.initialized(), 5);
        }
        assert_eq!(drops.get(), 5);
        unsafe { Global.deallocate_array(ptr, 8) };
    }

    #[test]
    fn test_scoped_init_finish_hands_over_ownership() {
        let drops = Rc::new(Cell::new(0));
        let ptr = Global.allocate_array::<Tracked>(4).unwrap();
        let mut guard = unsafe { ScopedInit::new(ptr, 4) };
        guard
            .fill_with(|_| Ok::<_, ()>(Tracked(drops.clone())))
            .unwrap();
        assert_eq!(guard.finish(), 4);
        assert_eq!(drops.get(), 0);
        unsafe {
            destroy_range(ptr.as_ptr(), 4);
            Global.deallocate_array(ptr, 4);
        }
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn test_scoped_init_drops_prefix_on_panic() {
        let drops = Rc::new(Cell::new(0));
        let ptr = Global.allocate_array::<Tracked>(4).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut guard = unsafe { ScopedInit::new(ptr, 4) };
            guard
                .fill_with(|i| {
                    assert!(i < 2, "boom");
                    Ok::<_, ()>(Tracked(drops.clone()))
                })
                .unwrap();
        }));
        assert!(result.is_err());
        assert_eq!(drops.get(), 2);
        unsafe { Global.deallocate_array(ptr, 4) };
    }
}
