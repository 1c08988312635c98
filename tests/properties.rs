//! Property tests over random shapes, values and partitionings.

use binop::kernels::functors::{FloorDivide, Mod, Subtract};
use binop::kernels::promotion::promote_types;
use binop::{
    BinaryKernel, CpuKernel, DType, ElementOp, GpuDevice, GpuKernel, HostDevice,
    Layout, StridedV, StridedVMut,
};
use proptest::prelude::*;
use proptest::sample::select;

fn dtype() -> impl Strategy<Value = DType> {
    select(DType::ALL.to_vec())
}

fn run<K: BinaryKernel>(kernel: &K, lhs: (&[i32], Layout), rhs: (&[i32], Layout), shape: &[usize]) -> Vec<i32> {
    let len = shape.iter().product();
    let mut out = vec![0i32; len];
    kernel
        .run(
            StridedV::new(lhs.0, lhs.1).unwrap(),
            StridedV::new(rhs.0, rhs.1).unwrap(),
            StridedVMut::new(&mut out, Layout::contiguous(shape)).unwrap(),
            Subtract,
        )
        .unwrap();
    out
}

proptest! {
    #[test]
    fn test_promotion_is_commutative(a in dtype(), b in dtype()) {
        prop_assert_eq!(promote_types(a, b), promote_types(b, a));
    }

    #[test]
    fn test_promotion_is_idempotent(a in dtype(), b in dtype()) {
        let p = promote_types(a, b);
        prop_assert_eq!(promote_types(p, a), p);
        prop_assert_eq!(promote_types(p, b), p);
    }

    #[cfg(feature = "parallel_proc")]
    #[test]
    fn test_any_chunking_matches_single_thread(
        values in prop::collection::vec(any::<i32>(), 1..300),
        chunks in 1usize..64,
    ) {
        let config = binop::ExecutionConfig::default().with_num_threads(4);
        let n = values.len();
        let reversed = Layout::new(vec![n], vec![-1], n - 1);
        let lhs = (&values[..], Layout::contiguous(&[n]));
        let expected = run(&CpuKernel, lhs.clone(), (&values[..], reversed.clone()), &[n]);
        let kernel = binop::OmpKernel::new(&config).with_chunks(chunks);
        prop_assert_eq!(run(&kernel, lhs, (&values[..], reversed), &[n]), expected);
    }

    #[test]
    fn test_broadcast_matches_materialized(
        rows in 1usize..12,
        row in prop::collection::vec(any::<i32>(), 1..12),
        col_seed in any::<i32>(),
        block in 1u32..64,
    ) {
        let cols = row.len();
        let shape = [rows, cols];
        let column: Vec<i32> = (0..rows as i32).map(|i| col_seed.wrapping_mul(i + 1)).collect();
        let dense_row: Vec<i32> = row.iter().copied().cycle().take(rows * cols).collect();
        let dense_col: Vec<i32> = column.iter().flat_map(|&c| std::iter::repeat_n(c, cols)).collect();

        let broadcast = run(
            &CpuKernel,
            (&column[..], Layout::contiguous(&[rows, 1]).broadcast_to(&shape).unwrap()),
            (&row[..], Layout::contiguous(&[cols]).broadcast_to(&shape).unwrap()),
            &shape,
        );
        let dense = run(
            &CpuKernel,
            (&dense_col[..], Layout::contiguous(&shape)),
            (&dense_row[..], Layout::contiguous(&shape)),
            &shape,
        );
        prop_assert_eq!(&broadcast, &dense);

        let device = GpuDevice::Host(HostDevice::new(block));
        let on_device = run(
            &GpuKernel::new(&device),
            (&column[..], Layout::contiguous(&[rows, 1]).broadcast_to(&shape).unwrap()),
            (&row[..], Layout::contiguous(&[cols]).broadcast_to(&shape).unwrap()),
            &shape,
        );
        prop_assert_eq!(on_device, dense);
    }

    #[test]
    fn test_floor_division_identity(a in any::<i64>(), b in any::<i64>().prop_filter("non-zero", |b| *b != 0)) {
        let q = <FloorDivide as ElementOp<i64>>::apply(&FloorDivide, a, b).unwrap();
        let r = <Mod as ElementOp<i64>>::apply(&Mod, a, b).unwrap();
        prop_assert_eq!(q.wrapping_mul(b).wrapping_add(r), a);
        prop_assert!(r == 0 || (r < 0) == (b < 0));
    }
}
