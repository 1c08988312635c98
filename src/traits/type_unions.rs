// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Type Unions
//!
//! Trait family over the closed element set, used as bounds on the typed
//! views, functors and kernels.
//!
//! - [`Primitive`] - every element type, including `bool`. Carries the type
//!   tag, `as`-style conversion and the erase/downcast hooks that connect the
//!   typed views to their tagged enums.
//! - [`Numeric`] - integers and floats.
//! - [`Integer`] / [`Float`] - the two numeric halves, bounded on *num-traits*.

use std::fmt::{Debug, Display};

use num_traits::{
    CheckedDiv, CheckedRem, Float as NumFloat, Num, NumCast, PrimInt, ToPrimitive, WrappingAdd,
    WrappingMul, WrappingSub,
};
use vec64::Vec64;

use crate::kernels::functors::Arithmetic;
use crate::{ArrayV, ArrayVMut, DType, HostBuffer, StridedV, StridedVMut};

/// Element types a device kernel can read and write.
///
/// With the `cuda` feature this requires the `cudarc` marker traits, so device
/// copies stay bound-checked at compile time. Without it every type qualifies.
#[cfg(feature = "cuda")]
pub trait DeviceElement:
    cudarc::driver::DeviceRepr + cudarc::driver::ValidAsZeroBits + Unpin
{
}
#[cfg(feature = "cuda")]
impl<T: cudarc::driver::DeviceRepr + cudarc::driver::ValidAsZeroBits + Unpin> DeviceElement for T {}

#[cfg(not(feature = "cuda"))]
pub trait DeviceElement {}
#[cfg(not(feature = "cuda"))]
impl<T> DeviceElement for T {}

/// Trait for types valid as primitive, i.e.., floats, integers, and booleans.
///
/// Useful when specifying `my_fn::<T: Primitive>() {}`.
pub trait Primitive:
    Copy + Default + PartialEq + PartialOrd + Debug + Display + Send + Sync + DeviceElement + 'static
{
    /// Runtime tag matching `Self`.
    const DTYPE: DType;

    /// `as`-style conversion into another element type.
    ///
    /// Floats truncate toward zero and saturate into integers, `bool` reads as
    /// `0` or `1`, and any non-zero value becomes `true`.
    fn cast<U: Primitive>(self) -> U;

    fn from_bool(v: bool) -> Self;
    fn from_i8(v: i8) -> Self;
    fn from_i16(v: i16) -> Self;
    fn from_i32(v: i32) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_u8(v: u8) -> Self;
    fn from_u16(v: u16) -> Self;
    fn from_u32(v: u32) -> Self;
    fn from_u64(v: u64) -> Self;
    fn from_f32(v: f32) -> Self;
    fn from_f64(v: f64) -> Self;

    /// Truth value used by the logical operations. NaN is truthy.
    #[inline(always)]
    fn is_truthy(self) -> bool {
        self != Self::default()
    }

    fn erase(view: StridedV<'_, Self>) -> ArrayV<'_>;
    fn erase_mut(view: StridedVMut<'_, Self>) -> ArrayVMut<'_>;
    fn downcast(view: ArrayV<'_>) -> Option<StridedV<'_, Self>>;
    fn downcast_mut(view: ArrayVMut<'_>) -> Option<StridedVMut<'_, Self>>;

    fn into_host(buf: Vec64<Self>) -> HostBuffer;
    fn host_slice(buf: &HostBuffer) -> Option<&[Self]>;
}

macro_rules! impl_primitive {
    // `bool` targets compare against zero, every other target uses `as`.
    (@from bool) => {
        #[inline(always)] fn from_bool(v: bool) -> Self { v }
        #[inline(always)] fn from_i8(v: i8) -> Self { v != 0 }
        #[inline(always)] fn from_i16(v: i16) -> Self { v != 0 }
        #[inline(always)] fn from_i32(v: i32) -> Self { v != 0 }
        #[inline(always)] fn from_i64(v: i64) -> Self { v != 0 }
        #[inline(always)] fn from_u8(v: u8) -> Self { v != 0 }
        #[inline(always)] fn from_u16(v: u16) -> Self { v != 0 }
        #[inline(always)] fn from_u32(v: u32) -> Self { v != 0 }
        #[inline(always)] fn from_u64(v: u64) -> Self { v != 0 }
        #[inline(always)] fn from_f32(v: f32) -> Self { v != 0.0 }
        #[inline(always)] fn from_f64(v: f64) -> Self { v != 0.0 }
    };
    (@from $t:ident) => {
        #[inline(always)] fn from_bool(v: bool) -> Self { v as u8 as $t }
        #[inline(always)] fn from_i8(v: i8) -> Self { v as $t }
        #[inline(always)] fn from_i16(v: i16) -> Self { v as $t }
        #[inline(always)] fn from_i32(v: i32) -> Self { v as $t }
        #[inline(always)] fn from_i64(v: i64) -> Self { v as $t }
        #[inline(always)] fn from_u8(v: u8) -> Self { v as $t }
        #[inline(always)] fn from_u16(v: u16) -> Self { v as $t }
        #[inline(always)] fn from_u32(v: u32) -> Self { v as $t }
        #[inline(always)] fn from_u64(v: u64) -> Self { v as $t }
        #[inline(always)] fn from_f32(v: f32) -> Self { v as $t }
        #[inline(always)] fn from_f64(v: f64) -> Self { v as $t }
    };
    ($($t:ident => $variant:ident, $dtype:ident, $from:ident);* $(;)?) => {
        $(
            impl Primitive for $t {
                const DTYPE: DType = DType::$dtype;

                #[inline(always)]
                fn cast<U: Primitive>(self) -> U {
                    U::$from(self)
                }

                impl_primitive!(@from $t);

                #[inline]
                fn erase(view: StridedV<'_, Self>) -> ArrayV<'_> {
                    ArrayV::$variant(view)
                }

                #[inline]
                fn erase_mut(view: StridedVMut<'_, Self>) -> ArrayVMut<'_> {
                    ArrayVMut::$variant(view)
                }

                #[inline]
                fn downcast(view: ArrayV<'_>) -> Option<StridedV<'_, Self>> {
                    match view {
                        ArrayV::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                #[inline]
                fn downcast_mut(view: ArrayVMut<'_>) -> Option<StridedVMut<'_, Self>> {
                    match view {
                        ArrayVMut::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                #[inline]
                fn into_host(buf: Vec64<Self>) -> HostBuffer {
                    HostBuffer::$variant(buf)
                }

                #[inline]
                fn host_slice(buf: &HostBuffer) -> Option<&[Self]> {
                    match buf {
                        HostBuffer::$variant(v) => Some(&v[..]),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool, Bool, from_bool;
    i8 => Int8, Int8, from_i8;
    i16 => Int16, Int16, from_i16;
    i32 => Int32, Int32, from_i32;
    i64 => Int64, Int64, from_i64;
    u8 => UInt8, UInt8, from_u8;
    u16 => UInt16, UInt16, from_u16;
    u32 => UInt32, UInt32, from_u32;
    u64 => UInt64, UInt64, from_u64;
    f32 => Float32, Float32, from_f32;
    f64 => Float64, Float64, from_f64;
}

/// Trait for types valid as numerical.
///
/// Useful when specifying `my_fn::<T: Numeric>() {}`.
///
/// Extends and constrains the *num-traits* `Num` implementation to fit the crate's type universe.
pub trait Numeric: Primitive + Num + NumCast + ToPrimitive {}
impl Numeric for f32 {}
impl Numeric for f64 {}
impl Numeric for i8 {}
impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for u8 {}
impl Numeric for u16 {}
impl Numeric for u32 {}
impl Numeric for u64 {}

/// Trait for types valid as integer elements.
///
/// The wrapping and checked bounds back the integer fault policy: overflow
/// wraps, and only a zero divisor or negative exponent faults.
pub trait Integer:
    Numeric
    + Arithmetic
    + PrimInt
    + WrappingAdd
    + WrappingSub
    + WrappingMul
    + CheckedDiv
    + CheckedRem
{
}
impl Integer for i8 {}
impl Integer for i16 {}
impl Integer for i32 {}
impl Integer for i64 {}
impl Integer for u8 {}
impl Integer for u16 {}
impl Integer for u32 {}
impl Integer for u64 {}

/// Trait for types valid as float elements.
///
/// Useful when specifying `my_fn::<T: Float>() {}`.
///
/// Extends and constrains the *num-traits* `Float` implementation to fit the crate's type universe.
pub trait Float: Numeric + Arithmetic + NumFloat {}
impl Float for f32 {}
impl Float for f64 {}
