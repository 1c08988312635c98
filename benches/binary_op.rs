//! Binary-op throughput per execution variant.
//!
//! Covers contiguous inputs, a broadcast row and a mixed-type pair that
//! needs promotion.
//!
//! Run with: `cargo bench --bench binary_op`

use std::hint::black_box;

use binop::{
    ArrayV, ArrayVMut, Backend, BinaryOpCode, ExecutionConfig, Layout, Scalar, TaskContext,
    VariantFn, BINARY_OP_TASK_ID, register_tasks,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const SIZES: [usize; 3] = [4_096, 65_536, 1_048_576];

fn variants() -> Vec<(Backend, VariantFn)> {
    let registry = register_tasks().expect("registry");
    Backend::ALL
        .into_iter()
        .filter_map(|b| registry.lookup(BINARY_OP_TASK_ID, b).map(|f| (b, f)))
        .collect()
}

fn bench_contiguous_add(c: &mut Criterion) {
    let config = ExecutionConfig::default();
    let mut group = c.benchmark_group("add_f32_contiguous");
    for &n in &SIZES {
        let a: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..n).map(|i| (i * 2) as f32).collect();
        let mut out = vec![0.0f32; n];
        group.throughput(Throughput::Elements(n as u64));
        for (backend, variant) in variants() {
            group.bench_with_input(BenchmarkId::new(backend.name(), n), &n, |bencher, &n| {
                bencher.iter(|| {
                    let ctx = TaskContext::new(&config)
                        .with_input(ArrayV::new(&a[..], Layout::contiguous(&[n])).unwrap())
                        .with_input(ArrayV::new(&b[..], Layout::contiguous(&[n])).unwrap())
                        .with_output(ArrayVMut::new(&mut out[..], Layout::contiguous(&[n])).unwrap())
                        .with_scalar(Scalar::from(BinaryOpCode::Add));
                    variant(ctx).unwrap();
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_broadcast_row(c: &mut Criterion) {
    let config = ExecutionConfig::default();
    let mut group = c.benchmark_group("multiply_i64_broadcast_row");
    let cols = 1024;
    for &n in &SIZES {
        let rows = n / cols;
        let a: Vec<i64> = (0..n as i64).collect();
        let row: Vec<i64> = (0..cols as i64).collect();
        let mut out = vec![0i64; n];
        group.throughput(Throughput::Elements(n as u64));
        for (backend, variant) in variants() {
            group.bench_with_input(BenchmarkId::new(backend.name(), n), &n, |bencher, _| {
                bencher.iter(|| {
                    let ctx = TaskContext::new(&config)
                        .with_input(ArrayV::new(&a[..], Layout::contiguous(&[rows, cols])).unwrap())
                        .with_input(ArrayV::new(&row[..], Layout::contiguous(&[cols])).unwrap())
                        .with_output(
                            ArrayVMut::new(&mut out[..], Layout::contiguous(&[rows, cols])).unwrap(),
                        )
                        .with_scalar(Scalar::from(BinaryOpCode::Multiply));
                    variant(ctx).unwrap();
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_promoted_pair(c: &mut Criterion) {
    let config = ExecutionConfig::default();
    let mut group = c.benchmark_group("less_i32_f32_promoted");
    for &n in &SIZES {
        let a: Vec<i32> = (0..n as i32).collect();
        let b: Vec<f32> = (0..n).map(|i| (n - i) as f32).collect();
        let mut out = vec![false; n];
        group.throughput(Throughput::Elements(n as u64));
        for (backend, variant) in variants() {
            group.bench_with_input(BenchmarkId::new(backend.name(), n), &n, |bencher, &n| {
                bencher.iter(|| {
                    let ctx = TaskContext::new(&config)
                        .with_input(ArrayV::new(&a[..], Layout::contiguous(&[n])).unwrap())
                        .with_input(ArrayV::new(&b[..], Layout::contiguous(&[n])).unwrap())
                        .with_output(ArrayVMut::new(&mut out[..], Layout::contiguous(&[n])).unwrap())
                        .with_scalar(Scalar::from(BinaryOpCode::Less));
                    variant(ctx).unwrap();
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_contiguous_add, bench_broadcast_row, bench_promoted_pair);
criterion_main!(benches);
