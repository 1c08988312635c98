// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Scalar Module - *Single Value Container*
//!
//! Contains the Scalar type for holding a single typed value.
//!
//! ## Purpose
//! - Carries task-level parameters: the operation code in slot 0 and any
//!   extra arguments an operation takes (e.g., the tolerances of `IsClose`).
//! - Its `dtype()` tag is checked against the operation registry at dispatch,
//!   never at use.

use std::fmt;

use crate::{BinaryOpCode, DType};

/// # Scalar
///
/// Scalar literals (single values) covering all supported element types.
///
/// ## Description
/// - Fixed-size, inline, `Copy`.
/// - `try_<class>` accessors read the value without panicking and return
///   `None` when the variant belongs to another type class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    // Unsigned integers
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    // Floats
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    /// Element type tag of the held value.
    #[inline]
    pub const fn dtype(&self) -> DType {
        match self {
            Scalar::Boolean(_) => DType::Bool,
            Scalar::Int8(_) => DType::Int8,
            Scalar::Int16(_) => DType::Int16,
            Scalar::Int32(_) => DType::Int32,
            Scalar::Int64(_) => DType::Int64,
            Scalar::UInt8(_) => DType::UInt8,
            Scalar::UInt16(_) => DType::UInt16,
            Scalar::UInt32(_) => DType::UInt32,
            Scalar::UInt64(_) => DType::UInt64,
            Scalar::Float32(_) => DType::Float32,
            Scalar::Float64(_) => DType::Float64,
        }
    }

    /// Reads an integer variant as `i64`.
    ///
    /// Returns `None` for booleans, floats, and `UInt64` values above `i64::MAX`.
    #[inline]
    pub fn try_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Int8(v) => Some(v as i64),
            Scalar::Int16(v) => Some(v as i64),
            Scalar::Int32(v) => Some(v as i64),
            Scalar::Int64(v) => Some(v),
            Scalar::UInt8(v) => Some(v as i64),
            Scalar::UInt16(v) => Some(v as i64),
            Scalar::UInt32(v) => Some(v as i64),
            Scalar::UInt64(v) => i64::try_from(v).ok(),
            Scalar::Boolean(_) | Scalar::Float32(_) | Scalar::Float64(_) => None,
        }
    }

    /// Reads a float variant as `f64`. Returns `None` for any other class.
    #[inline]
    pub fn try_f64(&self) -> Option<f64> {
        match *self {
            Scalar::Float32(v) => Some(v as f64),
            Scalar::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Reads a `Boolean` variant.
    #[inline]
    pub fn try_bool(&self) -> Option<bool> {
        match *self {
            Scalar::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(v) => write!(f, "{v}"),
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::UInt8(v) => write!(f, "{v}"),
            Scalar::UInt16(v) => write!(f, "{v}"),
            Scalar::UInt32(v) => write!(f, "{v}"),
            Scalar::UInt64(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
        }?;
        write!(f, ":{}", self.dtype())
    }
}

macro_rules! impl_scalar_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                #[inline]
                fn from(v: $t) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

impl_scalar_from!(
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

/// Op codes travel as `Int32` scalars.
impl From<BinaryOpCode> for Scalar {
    #[inline]
    fn from(op: BinaryOpCode) -> Self {
        Scalar::Int32(op.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tags() {
        assert_eq!(Scalar::from(1u16).dtype(), DType::UInt16);
        assert_eq!(Scalar::from(1.5f32).dtype(), DType::Float32);
        assert_eq!(Scalar::from(BinaryOpCode::Divide), Scalar::Int32(4));
    }

    #[test]
    fn test_try_accessors_respect_class() {
        assert_eq!(Scalar::UInt8(7).try_i64(), Some(7));
        assert_eq!(Scalar::UInt64(u64::MAX).try_i64(), None);
        assert_eq!(Scalar::Float64(2.0).try_i64(), None);
        assert_eq!(Scalar::Int32(2).try_f64(), None);
        assert_eq!(Scalar::Float32(0.5).try_f64(), Some(0.5));
        assert_eq!(Scalar::Boolean(true).try_bool(), Some(true));
    }

    #[test]
    fn test_display_includes_tag() {
        assert_eq!(Scalar::Int32(10).to_string(), "10:i32");
    }
}
