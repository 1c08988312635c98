// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Promotion** - *Common Compute Type and One-Time Operand Conversion*
//!
//! Resolves the compute type of a mixed-type pair and converts operands that
//! differ from it into an aligned [`Vec64`] buffer before the element loop,
//! so every kernel runs monomorphic over a single `T`.
//!
//! Conversion copies only the distinct elements of a broadcast operand and
//! re-expands them with stride-0 dimensions, so a broadcast row is converted
//! once rather than once per output row.

use std::convert::Infallible;

use tracing::trace;
use vec64::Vec64;

use crate::kernels::cursor::StridedCursor;
use crate::structs::views::with_variant;
use crate::traits::type_unions::Primitive;
use crate::{ArrayV, BinaryOpError, DType, Layout, StridedV};

/// Common type of two operands. Commutative.
///
/// - identical types stay as they are, and `Bool` yields to the other side;
/// - integers of equal signedness widen to the larger width;
/// - unsigned `uN` with signed `iM` gives `iM` when `M > N`, otherwise the
///   next wider signed type, or `Float64` once `u64` is involved;
/// - `Float32` absorbs 8 and 16-bit integers, wider integers go to `Float64`;
/// - anything with `Float64` is `Float64`.
pub fn promote_types(a: DType, b: DType) -> DType {
    if a == b || b.is_bool() {
        return a;
    }
    if a.is_bool() {
        return b;
    }
    match (a.is_float(), b.is_float()) {
        (true, true) => DType::Float64,
        (true, false) => float_with_integer(a, b),
        (false, true) => float_with_integer(b, a),
        (false, false) => integer_pair(a, b),
    }
}

/// Float type a floating-only operation computes in.
///
/// Floats stay as they are. `Bool`, 8 and 16-bit integers go to `Float32`,
/// 32 and 64-bit integers to `Float64`.
pub fn float_for(dtype: DType) -> DType {
    if dtype.is_float() {
        dtype
    } else if dtype.bits() <= 16 {
        DType::Float32
    } else {
        DType::Float64
    }
}

fn float_with_integer(float: DType, int: DType) -> DType {
    if float == DType::Float32 && int.bits() <= 16 {
        DType::Float32
    } else {
        DType::Float64
    }
}

fn integer_pair(a: DType, b: DType) -> DType {
    if a.is_signed_integer() == b.is_signed_integer() {
        return if a.bits() >= b.bits() { a } else { b };
    }
    let (signed, unsigned) = if a.is_signed_integer() { (a, b) } else { (b, a) };
    if signed.bits() > unsigned.bits() {
        return signed;
    }
    match unsigned.bits() {
        8 => DType::Int16,
        16 => DType::Int32,
        32 => DType::Int64,
        _ => DType::Float64,
    }
}

/// Operand in the compute type, either borrowed or converted.
#[derive(Debug)]
pub enum Operand<'a, T> {
    /// Already in the compute type. Carries the broadcast layout.
    Borrowed(StridedV<'a, T>),
    /// Converted copy of the distinct elements, with its packed layout.
    Converted(Vec64<T>, Layout),
}

impl<'a, T: Primitive> Operand<'a, T> {
    /// Typed view for the kernel.
    pub fn view(&self) -> StridedV<'_, T> {
        match self {
            Operand::Borrowed(v) => v.clone(),
            Operand::Converted(data, layout) => StridedV::from_parts(&data[..], layout.clone()),
        }
    }

    #[inline]
    pub fn is_converted(&self) -> bool {
        matches!(self, Operand::Converted(..))
    }
}

/// Brings `view` into compute type `T` under `broadcast`, a layout produced by
/// [`Layout::broadcast_to`] on the view's own layout.
pub fn promote_operand<'a, T: Primitive>(
    view: ArrayV<'a>,
    broadcast: Layout,
) -> Result<Operand<'a, T>, BinaryOpError> {
    let source = view.dtype();
    if source == T::DTYPE {
        return match T::downcast(view) {
            Some(v) => Ok(Operand::Borrowed(StridedV::from_parts(v.data(), broadcast))),
            None => Err(BinaryOpError::invalid_view(format!(
                "view tagged {source} does not hold {} elements",
                T::DTYPE
            ))),
        };
    }
    let (gather, packed) = broadcast.compact();
    let data = with_variant!(ArrayV, view, v => convert::<_, T>(v.data(), &gather));
    trace!(
        from = %source,
        to = %T::DTYPE,
        copied = data.len(),
        logical = packed.len(),
        "converted operand"
    );
    Ok(Operand::Converted(data, packed))
}

fn convert<S: Primitive, T: Primitive>(data: &[S], gather: &Layout) -> Vec64<T> {
    let mut out = Vec64::with_capacity(gather.len());
    let mut cursor = StridedCursor::new(gather.shape(), [gather]);
    let _ = cursor.try_for_each::<Infallible>(0, gather.len(), |_, [at]| {
        out.push(data[at].cast::<T>());
        Ok(())
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use DType::*;

    #[test]
    fn test_promotion_table() {
        assert_eq!(promote_types(Int32, Int32), Int32);
        assert_eq!(promote_types(Bool, UInt16), UInt16);
        assert_eq!(promote_types(Int8, Int64), Int64);
        assert_eq!(promote_types(UInt8, UInt32), UInt32);
        assert_eq!(promote_types(UInt8, Int16), Int16);
        assert_eq!(promote_types(UInt8, Int8), Int16);
        assert_eq!(promote_types(UInt16, Int16), Int32);
        assert_eq!(promote_types(UInt32, Int64), Int64);
        assert_eq!(promote_types(UInt32, Int8), Int64);
        assert_eq!(promote_types(UInt64, Int8), Float64);
        assert_eq!(promote_types(Float32, Int16), Float32);
        assert_eq!(promote_types(Float32, UInt32), Float64);
        assert_eq!(promote_types(Float32, Float64), Float64);
        assert_eq!(promote_types(Bool, Float32), Float32);
    }

    #[test]
    fn test_promotion_is_commutative() {
        for a in DType::ALL {
            for b in DType::ALL {
                assert_eq!(promote_types(a, b), promote_types(b, a), "{a} with {b}");
            }
        }
    }

    #[test]
    fn test_float_for() {
        assert_eq!(float_for(Bool), Float32);
        assert_eq!(float_for(Int16), Float32);
        assert_eq!(float_for(UInt32), Float64);
        assert_eq!(float_for(Float32), Float32);
    }

    #[test]
    fn test_same_type_operand_is_borrowed() {
        let data = [1i32, 2, 3];
        let view = ArrayV::new(&data[..], Layout::contiguous(&[3])).unwrap();
        let b = view.layout().broadcast_to(&[2, 3]).unwrap();
        let op = promote_operand::<i32>(view, b).unwrap();
        assert!(!op.is_converted());
        assert_eq!(op.view().to_vec64().to_vec(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_converted_operand_copies_distinct_elements_only() {
        let data = [1u8, 2, 3];
        let view = ArrayV::new(&data[..], Layout::contiguous(&[3])).unwrap();
        let b = view.layout().broadcast_to(&[4, 3]).unwrap();
        let op = promote_operand::<f64>(view, b).unwrap();
        match &op {
            Operand::Converted(buf, layout) => {
                assert_eq!(buf.len(), 3);
                assert_eq!(layout.shape(), &[4, 3]);
            }
            Operand::Borrowed(_) => panic!("expected a converted operand"),
        }
        assert_eq!(op.view().get(&[3, 2]), Some(3.0));
    }
}
