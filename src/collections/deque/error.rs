use core::convert::Infallible;
use core::fmt;

use crate::alloc::AllocError;

/// Failure of a fallible deque growth step.
///
/// `E` is the error type of the element factory passed to the `*_with`
/// constructors; it is [`Infallible`] for operations that move an existing
/// value in. Whenever one of these is returned the deque is exactly as it was
/// before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeError<E = Infallible> {
    /// Storage for a buffer or the map could not be obtained.
    Alloc(AllocError),
    /// The element factory failed.
    Construct(E),
}

impl<E> From<AllocError> for DequeError<E> {
    fn from(err: AllocError) -> Self {
        DequeError::Alloc(err)
    }
}

impl DequeError<Infallible> {
    /// Unwraps the allocation error; the construction arm cannot occur.
    #[inline]
    pub fn into_alloc(self) -> AllocError {
        match self {
            DequeError::Alloc(err) => err,
            DequeError::Construct(never) => match never {},
        }
    }
}

impl<E: fmt::Display> fmt::Display for DequeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DequeError::Alloc(err) => write!(f, "deque growth failed: {err}"),
            DequeError::Construct(err) => write!(f, "element construction failed: {err}"),
        }
    }
}

impl<E> std::error::Error for DequeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DequeError::Alloc(err) => Some(err),
            DequeError::Construct(err) => Some(err),
        }
    }
}

/// An index was outside `0..len`.
///
/// Returned by the checked accessors [`Deque::at`](super::Deque::at) and
/// [`Deque::at_mut`](super::Deque::at_mut).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError {
    /// The rejected index.
    pub index: usize,
    /// Length of the deque at the time of the call.
    pub len: usize,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {} out of bounds for deque of length {}", self.index, self.len)
    }
}

impl std::error::Error for BoundsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::alloc::Layout;
    use std::error::Error;

    #[test]
    fn test_display() {
        let err: DequeError<BoundsError> = DequeError::Construct(BoundsError { index: 4, len: 2 });
        assert_eq!(
            err.to_string(),
            "element construction failed: index 4 out of bounds for deque of length 2"
        );
        assert!(err.source().is_some());

        let err: DequeError = AllocError::CapacityOverflow.into();
        assert_eq!(err.into_alloc(), AllocError::CapacityOverflow);
        let err: DequeError = DequeError::Alloc(AllocError::Exhausted {
            layout: Layout::new::<u8>(),
        });
        assert!(err.to_string().starts_with("deque growth failed"));
    }
}
