// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Views Module** - *Borrowed Strided Array Views*
//!
//! Typed and type-erased views over partition-local buffers owned by the runtime.
//!
//! ## Purpose
//! - [`StridedV`] / [`StridedVMut`] pair a borrowed slice with a [`Layout`].
//! - [`ArrayV`] / [`ArrayVMut`] erase the element type behind a tagged enum
//!   over the closed element set, resolved exactly once at dispatch.
//!
//! ## Invariants
//! - Construction validates the layout against the slice length, so every
//!   index in the view's domain maps to a valid element.
//! - Mutable views additionally reject layouts where two indices share an
//!   element, which keeps concurrent disjoint writes sound.
//! - Views never outlive the invocation that borrowed them.

use std::convert::Infallible;

use vec64::Vec64;

use crate::kernels::cursor::StridedCursor;
use crate::traits::type_unions::Primitive;
use crate::{BinaryOpError, DType, Layout};

/// # StridedView
///
/// Read-only strided view over a borrowed slice.
#[derive(Debug, Clone, PartialEq)]
pub struct StridedV<'a, T> {
    data: &'a [T],
    layout: Layout,
}

impl<'a, T: Primitive> StridedV<'a, T> {
    /// Validates `layout` against `data` and wraps both.
    pub fn new(data: &'a [T], layout: Layout) -> Result<Self, BinaryOpError> {
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Wraps a layout already known to fit `data`.
    #[inline]
    pub(crate) fn from_parts(data: &'a [T], layout: Layout) -> Self {
        debug_assert!(layout.validate(data.len()).is_ok());
        Self { data, layout }
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Element at a full n-dimensional index, or `None` when out of range.
    pub fn get(&self, index: &[usize]) -> Option<T> {
        if index.len() != self.layout.rank() {
            return None;
        }
        let mut pos = self.layout.offset() as isize;
        for ((&i, &extent), &stride) in index
            .iter()
            .zip(self.layout.shape())
            .zip(self.layout.strides())
        {
            if i >= extent {
                return None;
            }
            pos += i as isize * stride;
        }
        self.data.get(pos as usize).copied()
    }

    /// Gathers the logical elements in row-major order.
    pub fn to_vec64(&self) -> Vec64<T> {
        let mut out = Vec64::with_capacity(self.len());
        let mut cursor = StridedCursor::new(self.shape(), [&self.layout]);
        let _ = cursor.try_for_each::<Infallible>(0, self.len(), |_, [at]| {
            out.push(self.data[at]);
            Ok(())
        });
        out
    }
}

/// # StridedViewMut
///
/// Exclusive strided view over a borrowed output slice.
#[derive(Debug, PartialEq)]
pub struct StridedVMut<'a, T> {
    data: &'a mut [T],
    layout: Layout,
}

impl<'a, T: Primitive> StridedVMut<'a, T> {
    /// Validates `layout` against `data`, rejecting self-overlapping layouts.
    pub fn new(data: &'a mut [T], layout: Layout) -> Result<Self, BinaryOpError> {
        layout.validate(data.len())?;
        layout.check_no_self_overlap()?;
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Splits into the raw slice and its layout.
    #[inline]
    pub fn into_parts(self) -> (&'a mut [T], Layout) {
        (self.data, self.layout)
    }

    /// Read-only reborrow.
    #[inline]
    pub fn as_view(&self) -> StridedV<'_, T> {
        StridedV::from_parts(self.data, self.layout.clone())
    }
}

/// Expands `$body` once per variant of a tagged view or buffer enum, with the
/// typed payload bound to `$v`.
macro_rules! with_variant {
    ($enum:ident, $value:expr, $v:ident => $body:expr) => {
        match $value {
            $enum::Bool($v) => $body,
            $enum::Int8($v) => $body,
            $enum::Int16($v) => $body,
            $enum::Int32($v) => $body,
            $enum::Int64($v) => $body,
            $enum::UInt8($v) => $body,
            $enum::UInt16($v) => $body,
            $enum::UInt32($v) => $body,
            $enum::UInt64($v) => $body,
            $enum::Float32($v) => $body,
            $enum::Float64($v) => $body,
        }
    };
}
pub(crate) use with_variant;

/// # ArrayView
///
/// Type-erased read-only view. One variant per element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayV<'a> {
    Bool(StridedV<'a, bool>),
    Int8(StridedV<'a, i8>),
    Int16(StridedV<'a, i16>),
    Int32(StridedV<'a, i32>),
    Int64(StridedV<'a, i64>),
    UInt8(StridedV<'a, u8>),
    UInt16(StridedV<'a, u16>),
    UInt32(StridedV<'a, u32>),
    UInt64(StridedV<'a, u64>),
    Float32(StridedV<'a, f32>),
    Float64(StridedV<'a, f64>),
}

impl<'a> ArrayV<'a> {
    /// Validates and erases a typed slice in one step.
    pub fn new<T: Primitive>(data: &'a [T], layout: Layout) -> Result<Self, BinaryOpError> {
        StridedV::new(data, layout).map(T::erase)
    }

    pub fn dtype(&self) -> DType {
        with_variant!(ArrayV, self, v => dtype_of(v))
    }

    pub fn layout(&self) -> &Layout {
        with_variant!(ArrayV, self, v => v.layout())
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout().shape()
    }

    /// Typed view when the element type matches `T`.
    #[inline]
    pub fn downcast<T: Primitive>(self) -> Option<StridedV<'a, T>> {
        T::downcast(self)
    }
}

impl<'a, T: Primitive> From<StridedV<'a, T>> for ArrayV<'a> {
    fn from(view: StridedV<'a, T>) -> Self {
        T::erase(view)
    }
}

/// # ArrayViewMut
///
/// Type-erased output view. One variant per element type.
#[derive(Debug, PartialEq)]
pub enum ArrayVMut<'a> {
    Bool(StridedVMut<'a, bool>),
    Int8(StridedVMut<'a, i8>),
    Int16(StridedVMut<'a, i16>),
    Int32(StridedVMut<'a, i32>),
    Int64(StridedVMut<'a, i64>),
    UInt8(StridedVMut<'a, u8>),
    UInt16(StridedVMut<'a, u16>),
    UInt32(StridedVMut<'a, u32>),
    UInt64(StridedVMut<'a, u64>),
    Float32(StridedVMut<'a, f32>),
    Float64(StridedVMut<'a, f64>),
}

impl<'a> ArrayVMut<'a> {
    /// Validates and erases a typed output slice in one step.
    pub fn new<T: Primitive>(data: &'a mut [T], layout: Layout) -> Result<Self, BinaryOpError> {
        StridedVMut::new(data, layout).map(T::erase_mut)
    }

    pub fn dtype(&self) -> DType {
        with_variant!(ArrayVMut, self, v => dtype_of_mut(v))
    }

    pub fn layout(&self) -> &Layout {
        with_variant!(ArrayVMut, self, v => v.layout())
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout().shape()
    }

    #[inline]
    pub fn downcast<T: Primitive>(self) -> Option<StridedVMut<'a, T>> {
        T::downcast_mut(self)
    }
}

impl<'a, T: Primitive> From<StridedVMut<'a, T>> for ArrayVMut<'a> {
    fn from(view: StridedVMut<'a, T>) -> Self {
        T::erase_mut(view)
    }
}

#[inline(always)]
fn dtype_of<T: Primitive>(_: &StridedV<'_, T>) -> DType {
    T::DTYPE
}

#[inline(always)]
fn dtype_of_mut<T: Primitive>(_: &StridedVMut<'_, T>) -> DType {
    T::DTYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_view_get() {
        let data = [0i32, 1, 2, 3, 4, 5];
        let v = StridedV::new(&data[..], Layout::new(vec![2, 3], vec![1, 2], 0)).unwrap();
        assert_eq!(v.get(&[0, 0]), Some(0));
        assert_eq!(v.get(&[1, 2]), Some(5));
        assert_eq!(v.get(&[2, 0]), None);
        assert_eq!(v.to_vec64().to_vec(), vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_reversed_view_gathers_backwards() {
        let data = [1.0f64, 2.0, 3.0];
        let v = StridedV::new(&data[..], Layout::new(vec![3], vec![-1], 2)).unwrap();
        assert_eq!(v.to_vec64().to_vec(), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_out_of_bounds_view_is_rejected() {
        let data = [0u8; 4];
        let err = ArrayV::new(&data[..], Layout::contiguous(&[5])).unwrap_err();
        assert!(matches!(err, BinaryOpError::InvalidView { .. }));
    }

    #[test]
    fn test_aliasing_output_is_rejected() {
        let mut data = [0i64; 4];
        let err = ArrayVMut::new(&mut data[..], Layout::new(vec![4], vec![0], 0)).unwrap_err();
        assert!(matches!(err, BinaryOpError::InvalidView { .. }));
    }

    #[test]
    fn test_erased_roundtrip() {
        let data = [true, false];
        let v = ArrayV::new(&data[..], Layout::contiguous(&[2])).unwrap();
        assert_eq!(v.dtype(), DType::Bool);
        assert!(v.clone().downcast::<u8>().is_none());
        assert_eq!(v.downcast::<bool>().unwrap().get(&[1]), Some(false));

        let mut out = [0f32; 2];
        let o = ArrayVMut::new(&mut out[..], Layout::contiguous(&[2])).unwrap();
        assert_eq!(o.dtype(), DType::Float32);
        assert_eq!(o.shape(), &[2]);
    }
}
