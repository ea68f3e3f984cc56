//! The allocator seam: [`RawAlloc`], the [`Global`] allocator and [`AllocError`].

use core::alloc::Layout;
use core::ptr::NonNull;

/// A raw memory allocator used by the containers of this crate.
///
/// This trait is similar to `std::alloc::Allocator` but is stable and much
/// smaller: it hands out untyped blocks and takes them back. It knows nothing
/// about element types or segmentation; typed storage is layered on top by
/// [`RawAlloc::allocate_array`] and [`RawAlloc::deallocate_array`].
///
/// Containers take one allocator per instantiation. Implement this trait on a
/// small handle type (or use `&A`) when several containers should share one
/// allocator.
pub trait RawAlloc {
    /// Allocates memory according to the given layout.
    ///
    /// `layout` always has a non-zero size when called through the typed
    /// helpers.
    ///
    /// # Errors
    /// Returns [`AllocError::Exhausted`] if the memory could not be obtained.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Deallocates memory.
    ///
    /// # Safety
    /// `ptr` must denote a block of memory currently allocated by this allocator.
    /// `layout` must be the same layout that was used to allocate that block of memory.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Allocates uninitialized storage for `n` values of `T`.
    ///
    /// Zero-sized requests never reach [`RawAlloc::allocate`]; they return a
    /// dangling, well-aligned pointer instead.
    ///
    /// # Errors
    /// Returns [`AllocError::CapacityOverflow`] if `n * size_of::<T>()`
    /// overflows, or the allocator's error if the block could not be obtained.
    #[inline]
    fn allocate_array<T>(&self, n: usize) -> Result<NonNull<T>, AllocError>
    where
        Self: Sized,
    {
        let layout = Layout::array::<T>(n).map_err(|_| AllocError::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        self.allocate(layout).map(NonNull::cast)
    }

    /// Releases storage obtained from [`RawAlloc::allocate_array`].
    ///
    /// # Safety
    /// `ptr` must come from `self.allocate_array::<T>(n)` with the same `n`,
    /// and must not be used afterwards. Any values still living in the block
    /// are leaked, not dropped.
    #[inline]
    unsafe fn deallocate_array<T>(&self, ptr: NonNull<T>, n: usize)
    where
        Self: Sized,
    {
        // SAFETY: the same layout was computed successfully at allocation time.
        let layout = Layout::array::<T>(n).unwrap_unchecked();
        if layout.size() != 0 {
            self.deallocate(ptr.cast(), layout);
        }
    }
}

impl<A: RawAlloc + ?Sized> RawAlloc for &A {
    #[inline(always)]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline(always)]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout);
    }
}

/// The process-wide allocator, forwarding to `std::alloc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);
        // SAFETY: callers never pass a zero-sized layout (see `allocate_array`).
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::Exhausted { layout })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The requested size overflowed `isize::MAX` bytes.
    CapacityOverflow,
    /// The allocator could not provide a block with the given layout.
    Exhausted {
        /// Layout of the failed request.
        layout: Layout,
    },
}

impl AllocError {
    /// Diverges the way std collections do on allocation failure.
    ///
    /// Capacity overflow panics; exhaustion calls
    /// [`std::alloc::handle_alloc_error`].
    #[cold]
    pub fn handle(self) -> ! {
        match self {
            AllocError::CapacityOverflow => panic!("capacity overflow"),
            AllocError::Exhausted { layout } => std::alloc::handle_alloc_error(layout),
        }
    }
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::CapacityOverflow => f.write_str("memory allocation failed: capacity overflow"),
            AllocError::Exhausted { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl std::error::Error for AllocError {}
