// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Dispatch** - *Resolve Once, Run Monomorphic*
//!
//! Turns a type-erased [`BinaryOpArgs`] into exactly one call of
//! [`BinaryKernel::run`] with concrete element and functor types.
//!
//! ## Steps
//! 1. Validate the extra scalar arguments against the operation signature.
//! 2. Resolve the compute type and the output type, then check the output view.
//! 3. Broadcast both input layouts to the output shape.
//! 4. Bring each input into the compute type (borrowed, or converted once).
//! 5. Match the compute type, then the operation, into a typed kernel call.
//!
//! The operation match for each class of compute type is exhaustive, so a
//! pair resolving in the registry without a typed kernel fails to compile
//! rather than surfacing at runtime.

use tracing::debug;

use crate::kernels::functors::{self, ElementOp, IsClose};
use crate::kernels::promotion::{Operand, promote_operand};
use crate::kernels::registry::OpInfo;
use crate::traits::type_unions::{Float, Integer, Primitive};
use crate::{ArrayVMut, Backend, BinaryOpArgs, BinaryOpCode, BinaryOpError, DType, StridedV, StridedVMut};

/// Execution substrate for a fully typed elementwise loop.
///
/// Implementations see views that already share the output shape, with
/// broadcast dimensions at stride `0`, and must write every output element
/// or report the lowest faulting linear index.
pub trait BinaryKernel {
    fn backend(&self) -> Backend;

    fn run<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError>;
}

/// Resolves `args` and runs it on `kernel`.
pub fn execute<K: BinaryKernel>(args: BinaryOpArgs<'_>, kernel: &K) -> Result<(), BinaryOpError> {
    let BinaryOpArgs {
        lhs,
        rhs,
        out,
        op,
        scalars,
    } = args;

    let info = OpInfo::of(op);
    info.check_scalars(&scalars)?;
    let compute = info.compute_type(lhs.dtype(), rhs.dtype())?;
    let output = info.output_type(compute);
    if out.dtype() != output {
        return Err(BinaryOpError::type_mismatch(
            op.name(),
            format!(
                "output view holds {} but {} with {} produces {}",
                out.dtype(),
                lhs.dtype(),
                rhs.dtype(),
                output
            ),
        ));
    }

    let shape = out.shape().to_vec();
    let lhs_layout = lhs.layout().broadcast_to(&shape)?;
    let rhs_layout = rhs.layout().broadcast_to(&shape)?;
    debug!(
        backend = %kernel.backend(),
        op = %op,
        lhs = %lhs.dtype(),
        rhs = %rhs.dtype(),
        compute = %compute,
        output = %output,
        elements = out.layout().len(),
        "dispatching binary op"
    );

    let call = Call {
        kernel,
        op,
        scalars: &scalars,
    };
    match compute {
        DType::Bool => call.bool(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Int8 => call.integer::<i8>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Int16 => call.integer::<i16>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Int32 => call.integer::<i32>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Int64 => call.integer::<i64>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::UInt8 => call.integer::<u8>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::UInt16 => call.integer::<u16>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::UInt32 => call.integer::<u32>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::UInt64 => call.integer::<u64>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Float32 => call.float::<f32>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
        DType::Float64 => call.float::<f64>(
            promote_operand(lhs, lhs_layout)?,
            promote_operand(rhs, rhs_layout)?,
            out,
        ),
    }
}

/// Expands to an exhaustive match over `$op`. Listed operations launch the
/// same-named functor, the rest are rejected for the compute type.
macro_rules! launch_ops {
    (
        $call:expr, $op:expr, $lhs:expr, $rhs:expr, $out:expr;
        run: [$($name:ident),* $(,)?];
        $(special: [$($special:ident => $functor:expr),* $(,)?];)?
        reject: [$($reject:ident),* $(,)?] $(,)?
    ) => {
        match $op {
            $(BinaryOpCode::$name => $call.launch($lhs, $rhs, $out, functors::$name),)*
            $($(BinaryOpCode::$special => $call.launch($lhs, $rhs, $out, $functor),)*)?
            $(BinaryOpCode::$reject)|* => Err($call.no_kernel::<T>()),
        }
    };
}

struct Call<'c, K> {
    kernel: &'c K,
    op: BinaryOpCode,
    scalars: &'c [crate::Scalar],
}

impl<K: BinaryKernel> Call<'_, K> {
    fn launch<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: &Operand<'_, T>,
        rhs: &Operand<'_, T>,
        out: ArrayVMut<'_>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        let found = out.dtype();
        let out = <Op::Output as Primitive>::downcast_mut(out).ok_or_else(|| {
            BinaryOpError::type_mismatch(
                self.op.name(),
                format!(
                    "output view holds {found}, kernel writes {}",
                    <Op::Output as Primitive>::DTYPE
                ),
            )
        })?;
        self.kernel.run(lhs.view(), rhs.view(), out, op)
    }

    fn no_kernel<T: Primitive>(&self) -> BinaryOpError {
        BinaryOpError::type_mismatch(
            self.op.name(),
            format!("no kernel for compute type {}", T::DTYPE),
        )
    }

    fn bool(
        &self,
        lhs: Operand<'_, bool>,
        rhs: Operand<'_, bool>,
        out: ArrayVMut<'_>,
    ) -> Result<(), BinaryOpError> {
        type T = bool;
        launch_ops!(self, self.op, &lhs, &rhs, out;
            run: [
                Add, Multiply, Maximum, Minimum,
                Equal, NotEqual, Less, LessEqual, Greater, GreaterEqual,
                LogicalAnd, LogicalOr, LogicalXor,
                BitwiseAnd, BitwiseOr, BitwiseXor,
            ];
            reject: [
                Subtract, Divide, FloorDivide, Mod, Fmod, Power,
                LeftShift, RightShift, Gcd, Lcm,
                Arctan2, Hypot, Copysign, IsClose,
            ]
        )
    }

    fn integer<T: Integer>(
        &self,
        lhs: Operand<'_, T>,
        rhs: Operand<'_, T>,
        out: ArrayVMut<'_>,
    ) -> Result<(), BinaryOpError> {
        launch_ops!(self, self.op, &lhs, &rhs, out;
            run: [
                Add, Subtract, Multiply, Divide, FloorDivide, Mod, Fmod, Power,
                Maximum, Minimum,
                Equal, NotEqual, Less, LessEqual, Greater, GreaterEqual,
                LogicalAnd, LogicalOr, LogicalXor,
                BitwiseAnd, BitwiseOr, BitwiseXor,
                LeftShift, RightShift, Gcd, Lcm,
            ];
            reject: [Arctan2, Hypot, Copysign, IsClose]
        )
    }

    fn float<T: Float>(
        &self,
        lhs: Operand<'_, T>,
        rhs: Operand<'_, T>,
        out: ArrayVMut<'_>,
    ) -> Result<(), BinaryOpError> {
        launch_ops!(self, self.op, &lhs, &rhs, out;
            run: [
                Add, Subtract, Multiply, Divide, FloorDivide, Mod, Fmod, Power,
                Maximum, Minimum,
                Equal, NotEqual, Less, LessEqual, Greater, GreaterEqual,
                LogicalAnd, LogicalOr, LogicalXor,
                Arctan2, Hypot, Copysign,
            ];
            special: [IsClose => IsClose::from_scalars(self.scalars)?];
            reject: [BitwiseAnd, BitwiseOr, BitwiseXor, LeftShift, RightShift, Gcd, Lcm]
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{ArrayV, Layout, Scalar};

    /// Records what reached the kernel instead of running it.
    #[derive(Default)]
    struct Probe {
        seen: RefCell<Vec<(BinaryOpCode, DType, DType)>>,
    }

    impl BinaryKernel for Probe {
        fn backend(&self) -> Backend {
            Backend::Cpu
        }

        fn run<T: Primitive, Op: ElementOp<T>>(
            &self,
            _lhs: StridedV<'_, T>,
            _rhs: StridedV<'_, T>,
            _out: StridedVMut<'_, Op::Output>,
            _op: Op,
        ) -> Result<(), BinaryOpError> {
            self.seen
                .borrow_mut()
                .push((Op::OP, T::DTYPE, <Op::Output as Primitive>::DTYPE));
            Ok(())
        }
    }

    fn args<'a>(
        lhs: ArrayV<'a>,
        rhs: ArrayV<'a>,
        out: ArrayVMut<'a>,
        op: BinaryOpCode,
        scalars: Vec<Scalar>,
    ) -> BinaryOpArgs<'a> {
        BinaryOpArgs {
            lhs,
            rhs,
            out,
            op,
            scalars,
        }
    }

    #[test]
    fn test_mixed_types_resolve_to_promoted_kernel() {
        let a = [1u8, 2];
        let b = [1i8, 2];
        let mut o = [0i16; 2];
        let probe = Probe::default();
        let l = Layout::contiguous(&[2]);
        execute(
            args(
                ArrayV::new(&a[..], l.clone()).unwrap(),
                ArrayV::new(&b[..], l.clone()).unwrap(),
                ArrayVMut::new(&mut o[..], l).unwrap(),
                BinaryOpCode::Add,
                vec![],
            ),
            &probe,
        )
        .unwrap();
        assert_eq!(
            probe.seen.borrow()[..],
            [(BinaryOpCode::Add, DType::Int16, DType::Int16)]
        );
    }

    #[test]
    fn test_wrong_output_type_is_rejected() {
        let a = [1i32, 2];
        let mut o = [0i32; 2];
        let l = Layout::contiguous(&[2]);
        let err = execute(
            args(
                ArrayV::new(&a[..], l.clone()).unwrap(),
                ArrayV::new(&a[..], l.clone()).unwrap(),
                ArrayVMut::new(&mut o[..], l).unwrap(),
                BinaryOpCode::Less,
                vec![],
            ),
            &Probe::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BinaryOpError::TypeMismatch { op: "less", .. }));
    }

    #[test]
    fn test_unbroadcastable_input_is_rejected() {
        let a = [1.0f32, 2.0, 3.0];
        let mut o = [0f32; 2];
        let err = execute(
            args(
                ArrayV::new(&a[..], Layout::contiguous(&[3])).unwrap(),
                ArrayV::new(&a[..], Layout::contiguous(&[3])).unwrap(),
                ArrayVMut::new(&mut o[..], Layout::contiguous(&[2])).unwrap(),
                BinaryOpCode::Add,
                vec![],
            ),
            &Probe::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BinaryOpError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_every_resolvable_pair_reaches_a_kernel() {
        let scalars = |op: BinaryOpCode| match op {
            BinaryOpCode::IsClose => vec![Scalar::Float64(1e-5), Scalar::Float64(1e-8)],
            _ => vec![],
        };
        for op in BinaryOpCode::ALL {
            let info = OpInfo::of(op);
            for dt in DType::ALL {
                let input = crate::HostBuffer::zeros(dt, 1);
                let resolved = info.compute_type(dt, dt);
                let out_dtype = match &resolved {
                    Ok(c) => info.output_type(*c),
                    Err(_) => dt,
                };
                let mut out = crate::HostBuffer::zeros(out_dtype, 1);
                let l = Layout::contiguous(&[1]);
                let probe = Probe::default();
                let result = execute(
                    args(
                        input.view(l.clone()).unwrap(),
                        input.view(l.clone()).unwrap(),
                        out.view_mut(l).unwrap(),
                        op,
                        scalars(op),
                    ),
                    &probe,
                );
                assert_eq!(result.is_ok(), resolved.is_ok(), "{op} on {dt}");
                if let Ok(compute) = resolved {
                    assert_eq!(probe.seen.borrow()[..], [(op, compute, out_dtype)]);
                }
            }
        }
    }
}
