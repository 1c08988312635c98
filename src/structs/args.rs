// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # BinaryOpArgs Module
//!
//! The argument bundle for one binary-op invocation, unpacked from a
//! [`TaskContext`] immediately before dispatch.

use crate::{ArrayV, ArrayVMut, BinaryOpCode, BinaryOpError, Scalar, TaskContext};

/// # BinaryOpArgs
///
/// Two input views, one output view, the operation and its extra scalar
/// arguments. Owns none of the buffers it refers to.
#[derive(Debug)]
pub struct BinaryOpArgs<'a> {
    pub lhs: ArrayV<'a>,
    pub rhs: ArrayV<'a>,
    pub out: ArrayVMut<'a>,
    pub op: BinaryOpCode,
    /// Extra scalar arguments, excluding the operation code.
    pub scalars: Vec<Scalar>,
}

impl<'a> TryFrom<TaskContext<'a>> for BinaryOpArgs<'a> {
    type Error = BinaryOpError;

    /// Reads the operation code first, so an unknown code is reported before
    /// any view is inspected.
    fn try_from(ctx: TaskContext<'a>) -> Result<Self, Self::Error> {
        let TaskContext {
            inputs,
            outputs,
            scalars,
            ..
        } = ctx;

        let mut scalars = scalars.into_iter();
        let code = match scalars.next() {
            // Above `i64::MAX` no registered code can match.
            Some(Scalar::UInt64(v)) => i64::try_from(v).unwrap_or(i64::MAX),
            Some(s) => s.try_i64().ok_or_else(|| {
                BinaryOpError::type_mismatch(
                    "binary_op",
                    format!("operation code must be an integer scalar, found {}", s.dtype()),
                )
            })?,
            None => {
                return Err(BinaryOpError::invalid_view(
                    "task context carries no operation code scalar",
                ));
            }
        };
        let op = BinaryOpCode::from_code(code)?;

        let [lhs, rhs]: [ArrayV<'a>; 2] = inputs.try_into().map_err(|v: Vec<_>| {
            BinaryOpError::invalid_view(format!("expected 2 input views, found {}", v.len()))
        })?;
        let [out]: [ArrayVMut<'a>; 1] = outputs.try_into().map_err(|v: Vec<_>| {
            BinaryOpError::invalid_view(format!("expected 1 output view, found {}", v.len()))
        })?;

        Ok(BinaryOpArgs {
            lhs,
            rhs,
            out,
            op,
            scalars: scalars.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecutionConfig, Layout};

    #[test]
    fn test_unknown_code_reported_before_views() {
        let config = ExecutionConfig::default();
        // No views at all: the code is still checked first.
        let ctx = TaskContext::new(&config).with_scalar(Scalar::Int32(9999));
        assert_eq!(
            BinaryOpArgs::try_from(ctx).unwrap_err(),
            BinaryOpError::UnsupportedOperation { code: 9999 }
        );
    }

    #[test]
    fn test_missing_or_non_integer_code() {
        let config = ExecutionConfig::default();
        let err = BinaryOpArgs::try_from(TaskContext::new(&config)).unwrap_err();
        assert!(matches!(err, BinaryOpError::InvalidView { .. }));

        let ctx = TaskContext::new(&config).with_scalar(Scalar::Float64(1.0));
        let err = BinaryOpArgs::try_from(ctx).unwrap_err();
        assert!(matches!(err, BinaryOpError::TypeMismatch { .. }));
    }

    #[test]
    fn test_out_of_range_unsigned_code_is_unsupported() {
        let config = ExecutionConfig::default();
        let ctx = TaskContext::new(&config).with_scalar(Scalar::UInt64(u64::MAX));
        assert_eq!(
            BinaryOpArgs::try_from(ctx).unwrap_err(),
            BinaryOpError::UnsupportedOperation { code: i64::MAX }
        );

        let ctx = TaskContext::new(&config).with_scalar(Scalar::UInt64(1));
        let err = BinaryOpArgs::try_from(ctx).unwrap_err();
        assert!(matches!(err, BinaryOpError::InvalidView { .. }));
    }

    #[test]
    fn test_view_counts() {
        let config = ExecutionConfig::default();
        let a = [1i32];
        let ctx = TaskContext::new(&config)
            .with_input(ArrayV::new(&a[..], Layout::contiguous(&[1])).unwrap())
            .with_scalar(Scalar::from(BinaryOpCode::Add));
        let err = BinaryOpArgs::try_from(ctx).unwrap_err();
        assert!(matches!(err, BinaryOpError::InvalidView { .. }));
    }

    #[test]
    fn test_extra_scalars_follow_code() {
        let config = ExecutionConfig::default();
        let a = [1.0f64];
        let mut o = [false];
        let l = Layout::contiguous(&[1]);
        let ctx = TaskContext::new(&config)
            .with_input(ArrayV::new(&a[..], l.clone()).unwrap())
            .with_input(ArrayV::new(&a[..], l.clone()).unwrap())
            .with_output(ArrayVMut::new(&mut o[..], l).unwrap())
            .with_scalar(Scalar::from(BinaryOpCode::IsClose))
            .with_scalar(Scalar::Float64(0.1))
            .with_scalar(Scalar::Float64(0.2));
        let args = BinaryOpArgs::try_from(ctx).unwrap();
        assert_eq!(args.op, BinaryOpCode::IsClose);
        assert_eq!(args.scalars, vec![Scalar::Float64(0.1), Scalar::Float64(0.2)]);
    }
}
