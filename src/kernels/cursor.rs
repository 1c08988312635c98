// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Strided Cursor** - *Allocation-Free N-Dimensional Iteration*
//!
//! Walks a linear range of a row-major iteration domain and yields, per
//! element, the buffer position in each of `N` participating layouts.
//!
//! All operands share the iteration shape (inputs are broadcast to the output
//! shape beforehand), so one index vector drives every offset. State lives in
//! fixed `[_; MAX_DIM]` arrays. The innermost dimension runs as a tight loop
//! and the outer dimensions advance by carry.

use crate::{Layout, MAX_DIM};

/// Multi-operand strided cursor over a shared iteration shape.
#[derive(Debug, Clone)]
pub struct StridedCursor<const N: usize> {
    rank: usize,
    shape: [usize; MAX_DIM],
    strides: [[isize; MAX_DIM]; N],
    bases: [isize; N],
    index: [usize; MAX_DIM],
    offsets: [isize; N],
}

impl<const N: usize> StridedCursor<N> {
    /// Builds a cursor over `shape` for `layouts`, each of which must have
    /// that shape and a rank no greater than [`MAX_DIM`].
    pub fn new(shape: &[usize], layouts: [&Layout; N]) -> Self {
        debug_assert!(shape.len() <= MAX_DIM);
        let rank = shape.len();
        let mut dims = [0usize; MAX_DIM];
        dims[..rank].copy_from_slice(shape);

        let mut strides = [[0isize; MAX_DIM]; N];
        let mut bases = [0isize; N];
        for (k, layout) in layouts.iter().enumerate() {
            debug_assert_eq!(layout.shape(), shape);
            strides[k][..rank].copy_from_slice(layout.strides());
            bases[k] = layout.offset() as isize;
        }
        Self {
            rank,
            shape: dims,
            strides,
            bases,
            index: [0; MAX_DIM],
            offsets: bases,
        }
    }

    /// Positions the cursor on linear element `linear`.
    pub fn seek(&mut self, linear: usize) {
        let mut rem = linear;
        self.offsets = self.bases;
        for d in (0..self.rank).rev() {
            let extent = self.shape[d].max(1);
            let i = rem % extent;
            rem /= extent;
            self.index[d] = i;
            for k in 0..N {
                self.offsets[k] += i as isize * self.strides[k][d];
            }
        }
    }

    /// Buffer positions of linear element `linear`, without moving the cursor.
    pub fn offsets_at(&self, linear: usize) -> [usize; N] {
        let mut rem = linear;
        let mut offsets = self.bases;
        for d in (0..self.rank).rev() {
            let extent = self.shape[d].max(1);
            let i = (rem % extent) as isize;
            rem /= extent;
            for k in 0..N {
                offsets[k] += i * self.strides[k][d];
            }
        }
        offsets.map(|o| o as usize)
    }

    /// Visits linear elements `start..start + len` in row-major order.
    ///
    /// `f` receives the linear index and one buffer position per layout.
    /// Iteration stops at the first error, which is returned unchanged.
    pub fn try_for_each<E>(
        &mut self,
        start: usize,
        len: usize,
        mut f: impl FnMut(usize, [usize; N]) -> Result<(), E>,
    ) -> Result<(), E> {
        if len == 0 {
            return Ok(());
        }
        self.seek(start);
        if self.rank == 0 {
            return f(start, self.offsets.map(|o| o as usize));
        }

        let inner = self.rank - 1;
        let extent = self.shape[inner];
        let mut step = [0isize; N];
        for k in 0..N {
            step[k] = self.strides[k][inner];
        }

        let end = start + len;
        let mut linear = start;
        while linear < end {
            let run = (extent - self.index[inner]).min(end - linear);
            let mut at = self.offsets;
            for _ in 0..run {
                f(linear, at.map(|o| o as usize))?;
                for k in 0..N {
                    at[k] += step[k];
                }
                linear += 1;
            }
            if linear < end {
                self.advance(inner, run);
            }
        }
        Ok(())
    }

    /// Moves the innermost index forward by `run` and carries outward.
    #[inline]
    fn advance(&mut self, inner: usize, run: usize) {
        self.index[inner] += run;
        for k in 0..N {
            self.offsets[k] += run as isize * self.strides[k][inner];
        }
        let mut d = inner;
        while self.index[d] == self.shape[d] {
            for k in 0..N {
                self.offsets[k] -= self.shape[d] as isize * self.strides[k][d];
            }
            self.index[d] = 0;
            if d == 0 {
                return;
            }
            d -= 1;
            self.index[d] += 1;
            for k in 0..N {
                self.offsets[k] += self.strides[k][d];
            }
        }
    }
}

/// Output slice shared across workers that write disjoint positions.
///
/// Disjointness comes from the output view invariant: no two logical indices
/// of a mutable view share a position, and workers own disjoint index ranges.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SharedOut<T> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Send> Send for SharedOut<T> {}
unsafe impl<T: Send> Sync for SharedOut<T> {}

impl<T> SharedOut<T> {
    pub(crate) fn new(data: &mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
        }
    }

    /// # Safety
    /// `pos` is in bounds of the source slice and no other thread writes or
    /// reads `pos` during the borrow that produced `self`.
    #[inline(always)]
    pub(crate) unsafe fn write(&self, pos: usize, value: T) {
        debug_assert!(pos < self.len);
        unsafe { self.ptr.add(pos).write(value) }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn collect<const N: usize>(
        shape: &[usize],
        layouts: [&Layout; N],
        start: usize,
        len: usize,
    ) -> Vec<(usize, [usize; N])> {
        let mut seen = Vec::new();
        let mut cursor = StridedCursor::new(shape, layouts);
        let _ = cursor.try_for_each::<Infallible>(start, len, |i, at| {
            seen.push((i, at));
            Ok(())
        });
        seen
    }

    #[test]
    fn test_contiguous_walk() {
        let l = Layout::contiguous(&[2, 3]);
        let seen = collect(&[2, 3], [&l], 0, 6);
        let offsets: Vec<usize> = seen.iter().map(|(_, [o])| *o).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_broadcast_and_transposed_operands() {
        let out = Layout::contiguous(&[2, 3]);
        let row = Layout::contiguous(&[3]).broadcast_to(&[2, 3]).unwrap();
        let col_major = Layout::new(vec![2, 3], vec![1, 2], 0);
        let seen = collect(&[2, 3], [&out, &row, &col_major], 0, 6);
        let got: Vec<[usize; 3]> = seen.into_iter().map(|(_, at)| at).collect();
        assert_eq!(
            got,
            vec![
                [0, 0, 0],
                [1, 1, 2],
                [2, 2, 4],
                [3, 0, 1],
                [4, 1, 3],
                [5, 2, 5]
            ]
        );
    }

    #[test]
    fn test_partial_ranges_match_full_walk() {
        let l = Layout::new(vec![3, 2, 4], vec![8, -4, 1], 4);
        let full = collect(&[3, 2, 4], [&l], 0, 24);
        for start in 0..24 {
            for len in 0..=(24 - start) {
                let part = collect(&[3, 2, 4], [&l], start, len);
                assert_eq!(part[..], full[start..start + len]);
            }
        }
        let cursor = StridedCursor::new(&[3, 2, 4], [&l]);
        for (i, at) in full {
            assert_eq!(cursor.offsets_at(i), at);
        }
    }

    #[test]
    fn test_rank0_visits_once() {
        let l = Layout::scalar(7);
        let seen = collect(&[], [&l], 0, 1);
        assert_eq!(seen, vec![(0, [7])]);
    }

    #[test]
    fn test_empty_domain() {
        let l = Layout::contiguous(&[4, 0]);
        assert!(collect(&[4, 0], [&l], 0, 0).is_empty());
    }
}
