// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # HostBuffer Module - *Owned Runtime-Side Buffers*
//!
//! Owned, 64-byte aligned storage of a runtime-chosen element type, used by
//! callers that stand in for the runtime (tests, demos and benches) to hand
//! out views.

use vec64::Vec64;

use crate::structs::views::with_variant;
use crate::traits::type_unions::Primitive;
use crate::{ArrayV, ArrayVMut, BinaryOpError, DType, Layout};

/// # HostBuffer
///
/// Tagged owned buffer, one variant per element type.
#[derive(Debug, Clone, PartialEq)]
pub enum HostBuffer {
    Bool(Vec64<bool>),
    Int8(Vec64<i8>),
    Int16(Vec64<i16>),
    Int32(Vec64<i32>),
    Int64(Vec64<i64>),
    UInt8(Vec64<u8>),
    UInt16(Vec64<u16>),
    UInt32(Vec64<u32>),
    UInt64(Vec64<u64>),
    Float32(Vec64<f32>),
    Float64(Vec64<f64>),
}

impl HostBuffer {
    /// `len` default-valued elements of `dtype`.
    pub fn zeros(dtype: DType, len: usize) -> Self {
        Self::from_f64s(dtype, &vec![0.0; len])
    }

    /// Copies a typed slice.
    pub fn from_slice<T: Primitive>(values: &[T]) -> Self {
        T::into_host(Vec64::from_slice(values))
    }

    /// Converts `values` into `dtype` with `as` semantics.
    pub fn from_f64s(dtype: DType, values: &[f64]) -> Self {
        fn conv<T: Primitive>(values: &[f64]) -> HostBuffer {
            T::into_host(values.iter().map(|&v| T::from_f64(v)).collect())
        }
        match dtype {
            DType::Bool => conv::<bool>(values),
            DType::Int8 => conv::<i8>(values),
            DType::Int16 => conv::<i16>(values),
            DType::Int32 => conv::<i32>(values),
            DType::Int64 => conv::<i64>(values),
            DType::UInt8 => conv::<u8>(values),
            DType::UInt16 => conv::<u16>(values),
            DType::UInt32 => conv::<u32>(values),
            DType::UInt64 => conv::<u64>(values),
            DType::Float32 => conv::<f32>(values),
            DType::Float64 => conv::<f64>(values),
        }
    }

    pub fn dtype(&self) -> DType {
        with_variant!(HostBuffer, self, v => dtype_of(&v[..]))
    }

    pub fn len(&self) -> usize {
        with_variant!(HostBuffer, self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed contents when the element type is `T`.
    pub fn as_slice<T: Primitive>(&self) -> Option<&[T]> {
        T::host_slice(self)
    }

    /// Read-only view under `layout`.
    pub fn view(&self, layout: Layout) -> Result<ArrayV<'_>, BinaryOpError> {
        with_variant!(HostBuffer, self, v => ArrayV::new(&v[..], layout))
    }

    /// Output view under `layout`.
    pub fn view_mut(&mut self, layout: Layout) -> Result<ArrayVMut<'_>, BinaryOpError> {
        with_variant!(HostBuffer, self, v => ArrayVMut::new(&mut v[..], layout))
    }

    /// Elements widened to `f64`, `bool` as `0.0` or `1.0`.
    pub fn to_f64s(&self) -> Vec<f64> {
        with_variant!(HostBuffer, self, v => v.iter().map(|x| x.cast::<f64>()).collect())
    }

    /// Element-wise equality where floats compare by bit pattern, so NaN
    /// results of identical computations compare equal.
    pub fn bit_eq(&self, other: &HostBuffer) -> bool {
        match (self, other) {
            (HostBuffer::Float32(a), HostBuffer::Float32(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (HostBuffer::Float64(a), HostBuffer::Float64(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => self == other,
        }
    }
}

#[inline(always)]
fn dtype_of<T: Primitive>(_: &[T]) -> DType {
    T::DTYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64s_casts() {
        let b = HostBuffer::from_f64s(DType::Int8, &[1.9, -2.5, 300.0]);
        assert_eq!(b.as_slice::<i8>(), Some(&[1i8, -2, 127][..]));
        let b = HostBuffer::from_f64s(DType::Bool, &[0.0, 0.5]);
        assert_eq!(b.as_slice::<bool>(), Some(&[false, true][..]));
        assert_eq!(b.dtype(), DType::Bool);
    }

    #[test]
    fn test_views_validate() {
        let mut b = HostBuffer::zeros(DType::UInt32, 4);
        assert!(b.view(Layout::contiguous(&[2, 2])).is_ok());
        assert!(b.view(Layout::contiguous(&[5])).is_err());
        assert_eq!(b.view_mut(Layout::contiguous(&[4])).unwrap().dtype(), DType::UInt32);
    }

    #[test]
    fn test_bit_eq_treats_matching_nans_as_equal() {
        let a = HostBuffer::from_slice(&[f64::NAN, 1.0]);
        let b = HostBuffer::from_slice(&[f64::NAN, 1.0]);
        assert_ne!(a, b);
        assert!(a.bit_eq(&b));
        assert!(!a.bit_eq(&HostBuffer::from_slice(&[1.0f32, 1.0])));
    }
}
