// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **CPU Variant** - *Single-Threaded Elementwise Loop*
//!
//! Walks the whole output domain once in row-major order. The loop body here
//! is shared with the multithreaded variant, which runs it per chunk.

use crate::kernels::cursor::StridedCursor;
use crate::kernels::dispatch::BinaryKernel;
use crate::kernels::functors::ElementOp;
use crate::traits::type_unions::Primitive;
use crate::{Backend, BinaryOpError, Fault, Layout, StridedV, StridedVMut};

/// Single-threaded kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuKernel;

impl BinaryKernel for CpuKernel {
    fn backend(&self) -> Backend {
        Backend::Cpu
    }

    fn run<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        let len = out.len();
        let (data, layout) = out.into_parts();
        apply_range(&lhs, &rhs, &layout, 0, len, op, |_, at, value| {
            data[at] = value;
        })
        .map_err(|(index, fault)| fault_error::<T, Op>(fault, index))
    }
}

/// Applies `op` to linear elements `start..start + len`, handing each result
/// to `write` with its linear index and output position.
///
/// Stops at the first fault and returns it with its linear index.
#[inline]
pub(crate) fn apply_range<T, Op, W>(
    lhs: &StridedV<'_, T>,
    rhs: &StridedV<'_, T>,
    out: &Layout,
    start: usize,
    len: usize,
    op: Op,
    mut write: W,
) -> Result<(), (usize, Fault)>
where
    T: Primitive,
    Op: ElementOp<T>,
    W: FnMut(usize, usize, Op::Output),
{
    let (l, r) = (lhs.data(), rhs.data());
    let mut cursor = StridedCursor::new(out.shape(), [lhs.layout(), rhs.layout(), out]);
    cursor.try_for_each(start, len, |i, [li, ri, oi]| {
        let value = op.apply(l[li], r[ri]).map_err(|fault| (i, fault))?;
        write(i, oi, value);
        Ok(())
    })
}

#[inline]
pub(crate) fn fault_error<T: Primitive, Op: ElementOp<T>>(fault: Fault, index: usize) -> BinaryOpError {
    BinaryOpError::ArithmeticFault {
        op: Op::OP.name(),
        fault,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::functors::{Add, Divide, Less};

    #[test]
    fn test_broadcast_add() {
        let a = [1i32, 2, 3];
        let b = [10i32, 20];
        let mut o = [0i32; 6];
        let shape = [2, 3];
        let lhs = StridedV::new(&a[..], Layout::contiguous(&[3]).broadcast_to(&shape).unwrap()).unwrap();
        let rhs = StridedV::new(&b[..], Layout::contiguous(&[2, 1]).broadcast_to(&shape).unwrap()).unwrap();
        let out = StridedVMut::new(&mut o[..], Layout::contiguous(&shape)).unwrap();
        CpuKernel.run(lhs, rhs, out, Add).unwrap();
        assert_eq!(o, [11, 12, 13, 21, 22, 23]);
    }

    #[test]
    fn test_strided_output() {
        let a = [1.0f64, 2.0, 3.0];
        let mut o = [false; 6];
        let l = Layout::contiguous(&[3]);
        let lhs = StridedV::new(&a[..], l.clone()).unwrap();
        let rhs = StridedV::new(&a[..], Layout::new(vec![3], vec![-1], 2)).unwrap();
        let out = StridedVMut::new(&mut o[..], Layout::new(vec![3], vec![2], 1)).unwrap();
        CpuKernel.run(lhs, rhs, out, Less).unwrap();
        assert_eq!(o, [false, true, false, false, false, false]);
    }

    #[test]
    fn test_first_fault_is_reported() {
        let a = [4i32, 5, 6, 7];
        let b = [1i32, 0, 1, 0];
        let mut o = [0i32; 4];
        let l = Layout::contiguous(&[4]);
        let err = CpuKernel
            .run(
                StridedV::new(&a[..], l.clone()).unwrap(),
                StridedV::new(&b[..], l.clone()).unwrap(),
                StridedVMut::new(&mut o[..], l).unwrap(),
                Divide,
            )
            .unwrap_err();
        assert_eq!(
            err,
            BinaryOpError::ArithmeticFault {
                op: "divide",
                fault: Fault::DivideByZero,
                index: 1
            }
        );
        assert_eq!(o[0], 4);
    }
}
