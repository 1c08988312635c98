// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Layout Module - *Strided N-Dimensional Addressing*
//!
//! Shape, signed per-dimension strides and a base offset describing how an
//! n-dimensional index maps into a flat, borrowed buffer.
//!
//! ## Overview
//! - Strides count elements, not bytes, and may be negative.
//! - A stride of `0` on a dimension with extent above one is a broadcast.
//! - Rank is capped at [`MAX_DIM`] so iteration state fits in fixed arrays.
//! - [`Layout::validate`] proves that every reachable index lands inside a
//!   buffer of a given length. Views call it once at construction, so the
//!   kernels can index without re-checking shape.

use crate::utils::{element_count, row_major_strides};
use crate::{BinaryOpError, Offset, Stride};

/// Highest supported rank.
pub const MAX_DIM: usize = 9;

/// # Layout
///
/// Logical shape plus physical strides and base offset for one view.
///
/// ### Fields
/// - `shape`: extent per dimension, outermost first. Empty for rank 0.
/// - `strides`: element step per dimension.
/// - `offset`: buffer position of index `[0, .., 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<Stride>,
    offset: Offset,
}

impl Layout {
    /// Builds a layout from raw parts. Checked by [`Layout::validate`].
    pub fn new(shape: Vec<usize>, strides: Vec<Stride>, offset: Offset) -> Self {
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Dense row-major layout starting at offset `0`.
    pub fn contiguous(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: row_major_strides(shape),
            offset: 0,
        }
    }

    /// Rank-0 layout addressing the single element at `offset`.
    pub fn scalar(offset: Offset) -> Self {
        Self {
            shape: Vec::new(),
            strides: Vec::new(),
            offset,
        }
    }

    /// Returns a copy starting at `offset`.
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[Stride] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        element_count(&self.shape)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the layout against a buffer of `buf_len` elements.
    ///
    /// Fails with `InvalidView` when the rank exceeds [`MAX_DIM`], shape and
    /// strides disagree in length, or any reachable index falls outside
    /// `0..buf_len`. Empty layouts address nothing and always pass.
    pub fn validate(&self, buf_len: usize) -> Result<(), BinaryOpError> {
        if self.shape.len() != self.strides.len() {
            return Err(BinaryOpError::invalid_view(format!(
                "shape has {} dimensions but strides has {}",
                self.shape.len(),
                self.strides.len()
            )));
        }
        if self.rank() > MAX_DIM {
            return Err(BinaryOpError::invalid_view(format!(
                "rank {} exceeds the maximum of {}",
                self.rank(),
                MAX_DIM
            )));
        }
        if self.is_empty() {
            return Ok(());
        }
        let (lo, hi) = self.span();
        if lo < 0 || hi >= buf_len as i128 {
            return Err(BinaryOpError::invalid_view(format!(
                "layout reaches elements {lo}..={hi} of a buffer holding {buf_len}"
            )));
        }
        Ok(())
    }

    /// Lowest and highest reachable buffer positions of a non-empty layout.
    fn span(&self) -> (i128, i128) {
        let mut lo = self.offset as i128;
        let mut hi = self.offset as i128;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides) {
            let reach = (extent as i128 - 1) * stride as i128;
            if reach < 0 {
                lo += reach;
            } else {
                hi += reach;
            }
        }
        (lo, hi)
    }

    /// Broadcasts to `target`, aligning dimensions from the right.
    ///
    /// Missing leading dimensions and extent-1 dimensions are expanded with
    /// stride `0`. Any other extent disagreement is a `ShapeMismatch`.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Layout, BinaryOpError> {
        let mismatch = |message: Option<String>| BinaryOpError::ShapeMismatch {
            expected: target.to_vec(),
            found: self.shape.clone(),
            message,
        };
        if self.rank() > target.len() {
            return Err(mismatch(Some("input has a higher rank than the output".into())));
        }
        let lead = target.len() - self.rank();
        let mut strides = vec![0; target.len()];
        for (axis, &extent) in self.shape.iter().enumerate() {
            let want = target[lead + axis];
            strides[lead + axis] = if extent == want {
                self.strides[axis]
            } else if extent == 1 {
                0
            } else {
                return Err(mismatch(None));
            };
        }
        Ok(Layout {
            shape: target.to_vec(),
            strides,
            offset: self.offset,
        })
    }

    /// True for dense row-major layouts, ignoring strides of extent-1 dims.
    pub fn is_contiguous(&self) -> bool {
        let mut expected: Stride = 1;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if extent == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= extent as Stride;
        }
        true
    }

    /// True when some dimension of extent above one has stride `0`.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.shape
            .iter()
            .zip(&self.strides)
            .any(|(&extent, &stride)| extent > 1 && stride == 0)
    }

    /// Ensures no two logical indices share a buffer position.
    ///
    /// Dimensions are sorted by absolute stride. Each must step past the full
    /// span of every smaller one. Required of every output view.
    pub fn check_no_self_overlap(&self) -> Result<(), BinaryOpError> {
        let mut dims: Vec<(usize, usize)> = self
            .shape
            .iter()
            .zip(&self.strides)
            .filter(|(extent, _)| **extent > 1)
            .map(|(&extent, &stride)| (extent, stride.unsigned_abs()))
            .collect();
        if dims.iter().any(|&(_, stride)| stride == 0) {
            return Err(BinaryOpError::invalid_view(
                "output layout broadcasts a dimension (stride 0)",
            ));
        }
        dims.sort_unstable_by_key(|&(_, stride)| stride);
        let mut covered = 1usize;
        for (extent, stride) in dims {
            if stride < covered {
                return Err(BinaryOpError::invalid_view(
                    "output layout has interleaved dimensions that alias",
                ));
            }
            covered = stride.saturating_mul(extent);
        }
        Ok(())
    }

    /// Splits a broadcast layout into a gather layout and a packed layout.
    ///
    /// The gather layout walks only the distinct elements of `self`, its
    /// broadcast dimensions collapsed to extent 1. The packed layout addresses
    /// a dense buffer of those elements, re-expanded to the full shape with
    /// stride-0 broadcast dimensions.
    pub fn compact(&self) -> (Layout, Layout) {
        let reduced: Vec<usize> = self
            .shape
            .iter()
            .zip(&self.strides)
            .map(|(&extent, &stride)| if stride == 0 { 1.min(extent) } else { extent })
            .collect();
        let dense = row_major_strides(&reduced);
        let packed_strides = self
            .shape
            .iter()
            .zip(&reduced)
            .zip(dense)
            .map(|((&extent, &kept), stride)| if extent != kept { 0 } else { stride })
            .collect();
        let gather = Layout {
            shape: reduced,
            strides: self.strides.clone(),
            offset: self.offset,
        };
        let packed = Layout {
            shape: self.shape.clone(),
            strides: packed_strides,
            offset: 0,
        };
        (gather, packed)
    }
}
