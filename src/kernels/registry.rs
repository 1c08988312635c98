// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Operation Registry** - *Signatures of the Binary Operations*
//!
//! Maps every [`BinaryOpCode`] to its operand domain, result rule and the
//! types of its extra scalar arguments, and resolves the compute and output
//! element types for a pair of inputs.
//!
//! Resolution here and the typed dispatch in `kernels::dispatch` agree by
//! construction: a pair resolves successfully exactly when a typed kernel
//! exists for the compute type it resolves to.

use crate::kernels::promotion::{float_for, promote_types};
use crate::{BinaryOpCode, BinaryOpError, DType, Scalar};

/// Element types an operation accepts, after promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandDomain {
    /// Every element type.
    All,
    /// Integers and floats.
    Numeric,
    /// Integers and `Bool`.
    Integral,
    /// Integers only.
    Integer,
    /// Floats. Integral compute types are coerced with [`float_for`].
    Floating,
}

impl OperandDomain {
    pub fn admits(self, dtype: DType) -> bool {
        match self {
            OperandDomain::All => true,
            OperandDomain::Numeric => !dtype.is_bool(),
            OperandDomain::Integral => !dtype.is_float(),
            OperandDomain::Integer => dtype.is_integer(),
            OperandDomain::Floating => true,
        }
    }
}

/// How the output element type follows from the compute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultRule {
    /// Same as the compute type.
    Promoted,
    /// Always `Bool`.
    Boolean,
}

/// Signature of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub op: BinaryOpCode,
    pub domain: OperandDomain,
    pub result: ResultRule,
    /// Element types of the extra scalar arguments, in order.
    pub scalar_args: &'static [DType],
}

const NO_ARGS: &[DType] = &[];
const TOLERANCES: &[DType] = &[DType::Float64, DType::Float64];

impl OpInfo {
    /// Signature of a known operation.
    pub const fn of(op: BinaryOpCode) -> OpInfo {
        use BinaryOpCode::*;
        use OperandDomain as D;
        use ResultRule as R;

        let (domain, result) = match op {
            Add | Multiply | Maximum | Minimum => (D::All, R::Promoted),
            Subtract | Divide | FloorDivide | Mod | Fmod | Power => (D::Numeric, R::Promoted),
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => (D::All, R::Boolean),
            LogicalAnd | LogicalOr | LogicalXor => (D::All, R::Boolean),
            BitwiseAnd | BitwiseOr | BitwiseXor => (D::Integral, R::Promoted),
            LeftShift | RightShift | Gcd | Lcm => (D::Integer, R::Promoted),
            Arctan2 | Hypot | Copysign => (D::Floating, R::Promoted),
            IsClose => (D::Floating, R::Boolean),
        };
        let scalar_args = match op {
            IsClose => TOLERANCES,
            _ => NO_ARGS,
        };
        OpInfo {
            op,
            domain,
            result,
            scalar_args,
        }
    }

    /// Signature for a wire code, or `UnsupportedOperation`.
    pub fn lookup(code: i64) -> Result<OpInfo, BinaryOpError> {
        BinaryOpCode::from_code(code).map(OpInfo::of)
    }

    /// Type the element loop runs in for inputs `lhs` and `rhs`.
    ///
    /// Fails with `TypeMismatch` when the promoted type lies outside the
    /// operation's domain.
    pub fn compute_type(&self, lhs: DType, rhs: DType) -> Result<DType, BinaryOpError> {
        let promoted = promote_types(lhs, rhs);
        if !self.domain.admits(promoted) {
            return Err(BinaryOpError::type_mismatch(
                self.op.name(),
                format!("no specialization for {lhs} and {rhs} (promoted to {promoted})"),
            ));
        }
        Ok(match self.domain {
            OperandDomain::Floating => float_for(promoted),
            _ => promoted,
        })
    }

    /// Output element type for a given compute type.
    pub fn output_type(&self, compute: DType) -> DType {
        match self.result {
            ResultRule::Promoted => compute,
            ResultRule::Boolean => DType::Bool,
        }
    }

    /// Checks arity and tags of the extra scalar arguments.
    pub fn check_scalars(&self, args: &[Scalar]) -> Result<(), BinaryOpError> {
        if args.len() != self.scalar_args.len() {
            return Err(BinaryOpError::type_mismatch(
                self.op.name(),
                format!(
                    "expected {} extra scalar argument(s), found {}",
                    self.scalar_args.len(),
                    args.len()
                ),
            ));
        }
        for (slot, (arg, &want)) in args.iter().zip(self.scalar_args).enumerate() {
            if arg.dtype() != want {
                return Err(BinaryOpError::type_mismatch(
                    self.op.name(),
                    format!("scalar argument {slot} must be {want}, found {}", arg.dtype()),
                ));
            }
        }
        Ok(())
    }
}
