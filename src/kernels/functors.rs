// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Functors** - *Per-Element Binary Computations*
//!
//! One zero-sized type per operation, implementing [`ElementOp`] for every
//! element type in its domain. Kernels are generic over the functor, so each
//! `(operation, element type)` pair compiles to its own monomorphic loop.
//!
//! ## Integer policy
//! Integer results are defined or faulted, never implementation-defined:
//! - add, subtract, multiply and power wrap on overflow;
//! - a zero divisor in divide, floor divide, mod or fmod faults;
//! - a negative exponent in power faults;
//! - `MIN / -1` wraps to `MIN` and `MIN % -1` is `0`;
//! - shifts by a negative amount or by at least the bit width give `0`, or
//!   `-1` for a right shift of a negative value.
//!
//! ## Float policy
//! IEEE-754 throughout. Maximum and minimum propagate NaN.

use std::ops::{BitAnd, BitOr, BitXor};

use crate::traits::type_unions::{Float, Integer, Numeric, Primitive};
use crate::{BinaryOpCode, BinaryOpError, Fault, Scalar};

/// Elementwise computation for operands of type `T`.
pub trait ElementOp<T: Primitive>: Copy + Send + Sync {
    /// Output element type.
    type Output: Primitive;

    /// Operation this functor implements.
    const OP: BinaryOpCode;

    fn apply(&self, lhs: T, rhs: T) -> Result<Self::Output, Fault>;

    /// Extra runtime parameters, in scalar-argument order. Device kernels
    /// receive them as two `f64` values.
    #[inline]
    fn params(&self) -> [f64; 2] {
        [0.0; 2]
    }
}

/// Arithmetic shared by integers and floats, with each half's policy.
pub trait Arithmetic: Numeric {
    fn plus(self, rhs: Self) -> Self;
    fn minus(self, rhs: Self) -> Self;
    fn times(self, rhs: Self) -> Self;
    fn quotient(self, rhs: Self) -> Result<Self, Fault>;
    fn floor_quotient(self, rhs: Self) -> Result<Self, Fault>;
    /// Remainder with the sign of the divisor.
    fn modulo(self, rhs: Self) -> Result<Self, Fault>;
    /// Remainder with the sign of the dividend.
    fn remainder(self, rhs: Self) -> Result<Self, Fault>;
    fn power(self, rhs: Self) -> Result<Self, Fault>;
    fn maximum(self, rhs: Self) -> Self;
    fn minimum(self, rhs: Self) -> Self;
}

mod int {
    use num_traits::{CheckedRem, PrimInt, WrappingAdd, WrappingMul, WrappingSub};

    use crate::Fault;

    #[inline(always)]
    fn nonzero<T: PrimInt>(rhs: T) -> Result<(), Fault> {
        if rhs.is_zero() {
            Err(Fault::DivideByZero)
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    fn rem<T: PrimInt + CheckedRem>(lhs: T, rhs: T) -> T {
        lhs.checked_rem(&rhs).unwrap_or(T::zero())
    }

    #[inline]
    pub(super) fn quotient<T: PrimInt>(lhs: T, rhs: T) -> Result<T, Fault> {
        nonzero(rhs)?;
        Ok(lhs.checked_div(&rhs).unwrap_or(T::min_value()))
    }

    #[inline]
    pub(super) fn floor_quotient<T: PrimInt + CheckedRem + WrappingSub>(
        lhs: T,
        rhs: T,
    ) -> Result<T, Fault> {
        let q = quotient(lhs, rhs)?;
        let r = rem(lhs, rhs);
        if !r.is_zero() && ((r < T::zero()) != (rhs < T::zero())) {
            Ok(q.wrapping_sub(&T::one()))
        } else {
            Ok(q)
        }
    }

    #[inline]
    pub(super) fn modulo<T: PrimInt + CheckedRem + WrappingAdd>(lhs: T, rhs: T) -> Result<T, Fault> {
        nonzero(rhs)?;
        let r = rem(lhs, rhs);
        if !r.is_zero() && ((r < T::zero()) != (rhs < T::zero())) {
            Ok(r.wrapping_add(&rhs))
        } else {
            Ok(r)
        }
    }

    #[inline]
    pub(super) fn remainder<T: PrimInt + CheckedRem>(lhs: T, rhs: T) -> Result<T, Fault> {
        nonzero(rhs)?;
        Ok(rem(lhs, rhs))
    }

    /// Square-and-multiply over the exponent bits, wrapping on overflow.
    #[inline]
    pub(super) fn power<T: PrimInt + WrappingMul>(base: T, exp: T) -> Result<T, Fault> {
        if exp < T::zero() {
            return Err(Fault::NegativeExponent);
        }
        let mut bits = exp.to_u64().unwrap_or(0);
        let mut base = base;
        let mut acc = T::one();
        while bits > 0 {
            if bits & 1 == 1 {
                acc = acc.wrapping_mul(&base);
            }
            bits >>= 1;
            if bits > 0 {
                base = base.wrapping_mul(&base);
            }
        }
        Ok(acc)
    }

    #[inline(always)]
    fn shift_amount<T: PrimInt>(amount: T) -> Option<usize> {
        let width = T::zero().count_zeros() as usize;
        amount.to_usize().filter(|&n| n < width)
    }

    #[inline]
    pub(super) fn shift_left<T: PrimInt>(lhs: T, rhs: T) -> T {
        match shift_amount(rhs) {
            Some(n) => lhs << n,
            None => T::zero(),
        }
    }

    #[inline]
    pub(super) fn shift_right<T: PrimInt>(lhs: T, rhs: T) -> T {
        match shift_amount(rhs) {
            Some(n) => lhs >> n,
            None if lhs < T::zero() => !T::zero(),
            None => T::zero(),
        }
    }

    #[inline(always)]
    fn wrapping_abs<T: PrimInt + WrappingSub>(v: T) -> T {
        if v < T::zero() {
            T::zero().wrapping_sub(&v)
        } else {
            v
        }
    }

    /// Euclid on absolute values. Only `MIN` itself stays negative.
    #[inline]
    pub(super) fn gcd<T: PrimInt + CheckedRem + WrappingSub>(lhs: T, rhs: T) -> T {
        let (mut a, mut b) = (wrapping_abs(lhs), wrapping_abs(rhs));
        while !b.is_zero() {
            let r = wrapping_abs(rem(a, b));
            a = b;
            b = r;
        }
        a
    }

    #[inline]
    pub(super) fn lcm<T: PrimInt + CheckedRem + WrappingSub + WrappingMul>(lhs: T, rhs: T) -> T {
        if lhs.is_zero() || rhs.is_zero() {
            return T::zero();
        }
        let g = gcd(lhs, rhs);
        let reduced = wrapping_abs(lhs).checked_div(&g).unwrap_or(T::zero());
        wrapping_abs(reduced.wrapping_mul(&wrapping_abs(rhs)))
    }
}

mod float {
    use num_traits::Float;

    #[inline(always)]
    pub(super) fn copysign<T: Float>(magnitude: T, sign: T) -> T {
        if sign.is_sign_negative() {
            -magnitude.abs()
        } else {
            magnitude.abs()
        }
    }

    #[inline]
    pub(super) fn modulo<T: Float>(lhs: T, rhs: T) -> T {
        let r = lhs % rhs;
        if r.is_zero() {
            copysign(T::zero(), rhs)
        } else if (r < T::zero()) != (rhs < T::zero()) {
            r + rhs
        } else {
            r
        }
    }

    #[inline(always)]
    pub(super) fn maximum<T: Float>(lhs: T, rhs: T) -> T {
        if lhs.is_nan() || lhs >= rhs { lhs } else { rhs }
    }

    #[inline(always)]
    pub(super) fn minimum<T: Float>(lhs: T, rhs: T) -> T {
        if lhs.is_nan() || lhs <= rhs { lhs } else { rhs }
    }
}

macro_rules! impl_integer_arithmetic {
    ($($t:ty),*) => {
        $(
            impl Arithmetic for $t {
                #[inline(always)] fn plus(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
                #[inline(always)] fn minus(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
                #[inline(always)] fn times(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
                #[inline(always)] fn quotient(self, rhs: Self) -> Result<Self, Fault> { int::quotient(self, rhs) }
                #[inline(always)] fn floor_quotient(self, rhs: Self) -> Result<Self, Fault> { int::floor_quotient(self, rhs) }
                #[inline(always)] fn modulo(self, rhs: Self) -> Result<Self, Fault> { int::modulo(self, rhs) }
                #[inline(always)] fn remainder(self, rhs: Self) -> Result<Self, Fault> { int::remainder(self, rhs) }
                #[inline(always)] fn power(self, rhs: Self) -> Result<Self, Fault> { int::power(self, rhs) }
                #[inline(always)] fn maximum(self, rhs: Self) -> Self { Ord::max(self, rhs) }
                #[inline(always)] fn minimum(self, rhs: Self) -> Self { Ord::min(self, rhs) }
            }
        )*
    };
}

macro_rules! impl_float_arithmetic {
    ($($t:ty),*) => {
        $(
            impl Arithmetic for $t {
                #[inline(always)] fn plus(self, rhs: Self) -> Self { self + rhs }
                #[inline(always)] fn minus(self, rhs: Self) -> Self { self - rhs }
                #[inline(always)] fn times(self, rhs: Self) -> Self { self * rhs }
                #[inline(always)] fn quotient(self, rhs: Self) -> Result<Self, Fault> { Ok(self / rhs) }
                #[inline(always)] fn floor_quotient(self, rhs: Self) -> Result<Self, Fault> { Ok((self / rhs).floor()) }
                #[inline(always)] fn modulo(self, rhs: Self) -> Result<Self, Fault> { Ok(float::modulo(self, rhs)) }
                #[inline(always)] fn remainder(self, rhs: Self) -> Result<Self, Fault> { Ok(self % rhs) }
                #[inline(always)] fn power(self, rhs: Self) -> Result<Self, Fault> { Ok(self.powf(rhs)) }
                #[inline(always)] fn maximum(self, rhs: Self) -> Self { float::maximum(self, rhs) }
                #[inline(always)] fn minimum(self, rhs: Self) -> Self { float::minimum(self, rhs) }
            }
        )*
    };
}

impl_integer_arithmetic!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float_arithmetic!(f32, f64);

macro_rules! define_ops {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;
        )*
    };
}

define_ops!(
    /// `lhs + rhs`. Logical or on `bool`.
    Add,
    Subtract,
    /// `lhs * rhs`. Logical and on `bool`.
    Multiply,
    Divide,
    FloorDivide,
    /// Remainder taking the sign of the divisor.
    Mod,
    /// Remainder taking the sign of the dividend.
    Fmod,
    Power,
    Maximum,
    Minimum,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    Arctan2,
    Hypot,
    Copysign,
    Gcd,
    Lcm,
);

/// `|lhs - rhs| <= atol + rtol * |rhs|`, or exact equality, in `f64`.
///
/// NaN is never close to anything, including itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsClose {
    pub rtol: f64,
    pub atol: f64,
}

impl IsClose {
    /// Reads the tolerances from the extra scalar arguments `[rtol, atol]`.
    pub fn from_scalars(args: &[Scalar]) -> Result<Self, BinaryOpError> {
        match args {
            [Scalar::Float64(rtol), Scalar::Float64(atol)] => Ok(IsClose {
                rtol: *rtol,
                atol: *atol,
            }),
            _ => Err(BinaryOpError::type_mismatch(
                BinaryOpCode::IsClose.name(),
                "expected scalar arguments [rtol: f64, atol: f64]",
            )),
        }
    }
}

impl Default for IsClose {
    fn default() -> Self {
        IsClose {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

macro_rules! arithmetic_op {
    ($name:ident => $method:ident) => {
        impl<T: Arithmetic> ElementOp<T> for $name {
            type Output = T;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, lhs: T, rhs: T) -> Result<T, Fault> {
                Ok(lhs.$method(rhs))
            }
        }
    };
    ($name:ident => $method:ident?) => {
        impl<T: Arithmetic> ElementOp<T> for $name {
            type Output = T;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, lhs: T, rhs: T) -> Result<T, Fault> {
                lhs.$method(rhs)
            }
        }
    };
}

arithmetic_op!(Add => plus);
arithmetic_op!(Subtract => minus);
arithmetic_op!(Multiply => times);
arithmetic_op!(Divide => quotient?);
arithmetic_op!(FloorDivide => floor_quotient?);
arithmetic_op!(Mod => modulo?);
arithmetic_op!(Fmod => remainder?);
arithmetic_op!(Power => power?);
arithmetic_op!(Maximum => maximum);
arithmetic_op!(Minimum => minimum);

macro_rules! bool_op {
    ($name:ident, |$l:ident, $r:ident| $body:expr) => {
        impl ElementOp<bool> for $name {
            type Output = bool;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, $l: bool, $r: bool) -> Result<bool, Fault> {
                Ok($body)
            }
        }
    };
}

bool_op!(Add, |l, r| l | r);
bool_op!(Multiply, |l, r| l & r);
bool_op!(Maximum, |l, r| l | r);
bool_op!(Minimum, |l, r| l & r);

macro_rules! predicate_op {
    ($name:ident, |$l:ident, $r:ident| $body:expr) => {
        impl<T: Primitive> ElementOp<T> for $name {
            type Output = bool;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, $l: T, $r: T) -> Result<bool, Fault> {
                Ok($body)
            }
        }
    };
}

predicate_op!(Equal, |l, r| l == r);
predicate_op!(NotEqual, |l, r| l != r);
predicate_op!(Less, |l, r| l < r);
predicate_op!(LessEqual, |l, r| l <= r);
predicate_op!(Greater, |l, r| l > r);
predicate_op!(GreaterEqual, |l, r| l >= r);
predicate_op!(LogicalAnd, |l, r| l.is_truthy() && r.is_truthy());
predicate_op!(LogicalOr, |l, r| l.is_truthy() || r.is_truthy());
predicate_op!(LogicalXor, |l, r| l.is_truthy() != r.is_truthy());

macro_rules! bitwise_op {
    ($name:ident, $bound:ident, $op:tt) => {
        impl<T: Primitive + $bound<Output = T>> ElementOp<T> for $name {
            type Output = T;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, lhs: T, rhs: T) -> Result<T, Fault> {
                Ok(lhs $op rhs)
            }
        }
    };
}

bitwise_op!(BitwiseAnd, BitAnd, &);
bitwise_op!(BitwiseOr, BitOr, |);
bitwise_op!(BitwiseXor, BitXor, ^);

macro_rules! integer_op {
    ($name:ident => $f:path) => {
        impl<T: Integer> ElementOp<T> for $name {
            type Output = T;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, lhs: T, rhs: T) -> Result<T, Fault> {
                Ok($f(lhs, rhs))
            }
        }
    };
}

integer_op!(LeftShift => int::shift_left);
integer_op!(RightShift => int::shift_right);
integer_op!(Gcd => int::gcd);
integer_op!(Lcm => int::lcm);

macro_rules! float_op {
    ($name:ident, |$l:ident, $r:ident| $body:expr) => {
        impl<T: Float> ElementOp<T> for $name {
            type Output = T;
            const OP: BinaryOpCode = BinaryOpCode::$name;

            #[inline(always)]
            fn apply(&self, $l: T, $r: T) -> Result<T, Fault> {
                Ok($body)
            }
        }
    };
}

float_op!(Arctan2, |l, r| num_traits::Float::atan2(l, r));
float_op!(Hypot, |l, r| num_traits::Float::hypot(l, r));
float_op!(Copysign, |l, r| float::copysign(l, r));

impl<T: Float> ElementOp<T> for IsClose {
    type Output = bool;
    const OP: BinaryOpCode = BinaryOpCode::IsClose;

    #[inline(always)]
    fn apply(&self, lhs: T, rhs: T) -> Result<bool, Fault> {
        let (a, b) = (lhs.cast::<f64>(), rhs.cast::<f64>());
        // Infinities are only close to themselves.
        if a.is_infinite() || b.is_infinite() {
            return Ok(a == b);
        }
        Ok(a == b || (a - b).abs() <= self.atol + self.rtol * b.abs())
    }

    #[inline]
    fn params(&self) -> [f64; 2] {
        [self.rtol, self.atol]
    }
}
