//! `(node, offset)` positions and the cross-buffer arithmetic on them.
//!
//! A position never dereferences anything; it is plain data. All arithmetic
//! takes the buffer size `buf` explicitly so the same code serves every
//! element type. Node indices wrap on underflow, so a position moved before
//! the first map slot compares greater than every live position and is
//! rejected by range checks instead of panicking.

/// A position inside a segmented sequence.
///
/// Ordering is by map node first, then by offset within the buffer, which is
/// exactly logical order for positions of the same deque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub(crate) node: usize,
    pub(crate) offset: usize,
}

impl Position {
    #[inline(always)]
    pub(crate) const fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Map slot this position lives in.
    #[inline(always)]
    pub const fn node(&self) -> usize {
        self.node
    }

    /// Offset within the buffer of [`Position::node`].
    #[inline(always)]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// One step forward, rolling over into the next node at the buffer end.
    #[inline(always)]
    pub(crate) const fn next(self, buf: usize) -> Self {
        if self.offset + 1 == buf {
            Self::new(self.node.wrapping_add(1), 0)
        } else {
            Self::new(self.node, self.offset + 1)
        }
    }

    /// One step backward, rolling over into the previous node's last slot.
    #[inline(always)]
    pub(crate) const fn prev(self, buf: usize) -> Self {
        if self.offset == 0 {
            Self::new(self.node.wrapping_sub(1), buf - 1)
        } else {
            Self::new(self.node, self.offset - 1)
        }
    }

    /// Moves by a signed number of elements.
    ///
    /// Within the current buffer this is a single add. Otherwise the node
    /// displacement is the *floor* of `offset / buf` (Euclidean division),
    /// which truncating division would get wrong for leftward moves.
    #[inline]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub(crate) const fn offset_by(self, n: isize, buf: usize) -> Self {
        let buf = buf as isize;
        let offset = n + self.offset as isize;
        if offset >= 0 && offset < buf {
            Self::new(self.node, offset as usize)
        } else {
            let node_delta = offset.div_euclid(buf);
            Self::new(
                self.node.wrapping_add_signed(node_delta),
                offset.rem_euclid(buf) as usize,
            )
        }
    }

    /// Signed number of elements from `origin` to `self`.
    ///
    /// Counts the full buffers strictly between the two nodes plus the two
    /// partial remainders.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) const fn distance(self, origin: Self, buf: usize) -> isize {
        let nodes = self.node.wrapping_sub(origin.node) as isize;
        (buf as isize) * (nodes - 1) + self.offset as isize + (buf - origin.offset) as isize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUF: usize = 4;

    #[test]
    fn test_step_across_boundaries() {
        let p = Position::new(3, 2);
        assert_eq!(p.next(BUF), Position::new(3, 3));
        assert_eq!(p.next(BUF).next(BUF), Position::new(4, 0));
        assert_eq!(Position::new(4, 0).prev(BUF), Position::new(3, 3));
        assert_eq!(Position::new(4, 1).prev(BUF), Position::new(4, 0));
    }

    #[test]
    fn test_offset_within_buffer() {
        let p = Position::new(5, 1);
        assert_eq!(p.offset_by(2, BUF), Position::new(5, 3));
        assert_eq!(p.offset_by(-1, BUF), Position::new(5, 0));
        assert_eq!(p.offset_by(0, BUF), p);
    }

    #[test]
    fn test_offset_floor_division_leftward() {
        let p = Position::new(5, 1);
        // offset = -1 -> one node back, last slot.
        assert_eq!(p.offset_by(-2, BUF), Position::new(4, 3));
        // offset = -4 -> exactly one node back, slot 0.
        assert_eq!(p.offset_by(-5, BUF), Position::new(4, 0));
        // offset = -5 -> two nodes back, slot 3.
        assert_eq!(p.offset_by(-6, BUF), Position::new(3, 3));
    }

    #[test]
    fn test_offset_rightward() {
        let p = Position::new(2, 3);
        assert_eq!(p.offset_by(1, BUF), Position::new(3, 0));
        assert_eq!(p.offset_by(9, BUF), Position::new(5, 0));
        assert_eq!(p.offset_by(10, BUF), Position::new(5, 1));
    }

    #[test]
    fn test_distance_matches_offset() {
        let origin = Position::new(7, 2);
        for n in -20isize..=20 {
            let p = origin.offset_by(n, BUF);
            assert_eq!(p.distance(origin, BUF), n, "n = {n}");
            assert_eq!(origin.distance(p, BUF), -n, "n = {n}");
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Position::new(1, 3) < Position::new(2, 0));
        assert!(Position::new(2, 0) < Position::new(2, 1));
        assert_eq!(Position::new(2, 1).max(Position::new(1, 3)), Position::new(2, 1));
    }
}
