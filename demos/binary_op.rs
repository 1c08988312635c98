//! Walks through a few binary ops the way a runtime would issue them:
//! look up the entry point, build a task context, invoke.
//!
//! Run with: `cargo run --example binary_op`

use binop::{
    ArrayV, ArrayVMut, BackendAvailability, BinaryOpCode, BinaryOpError, ExecutionConfig, Layout,
    Scalar, TaskContext, BINARY_OP_TASK_ID, register_tasks,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = register_tasks()?;
    let config = ExecutionConfig::from_env();
    let available = BackendAvailability {
        multithreading: cfg!(feature = "parallel_proc"),
        gpu: false,
    };
    let (backend, variant) = registry
        .select(BINARY_OP_TASK_ID, &available)
        .ok_or("binary op task is not registered")?;
    println!("Selected backend: {backend}");

    // Outer sum of a column and a row.
    let col = [1.0f32, 2.0, 3.0];
    let row = [10.0f32, 20.0, 30.0, 40.0];
    let mut grid = [0.0f32; 12];
    let ctx = TaskContext::new(&config)
        .with_input(ArrayV::new(&col[..], Layout::contiguous(&[3, 1]))?)
        .with_input(ArrayV::new(&row[..], Layout::contiguous(&[4]))?)
        .with_output(ArrayVMut::new(&mut grid[..], Layout::contiguous(&[3, 4]))?)
        .with_scalar(Scalar::from(BinaryOpCode::Add));
    variant(ctx)?;
    println!("\nOuter sum (3x1 + 4):");
    for r in grid.chunks(4) {
        println!("  {r:?}");
    }

    // Mixed types promote: i8 * u8 computes and stores in i16.
    let a = [-4i8, 100, 7];
    let b = [200u8, 3, 0];
    let mut prod = [0i16; 3];
    let ctx = TaskContext::new(&config)
        .with_input(ArrayV::new(&a[..], Layout::contiguous(&[3]))?)
        .with_input(ArrayV::new(&b[..], Layout::contiguous(&[3]))?)
        .with_output(ArrayVMut::new(&mut prod[..], Layout::contiguous(&[3]))?)
        .with_scalar(Scalar::from(BinaryOpCode::Multiply));
    variant(ctx)?;
    println!("\ni8 * u8 -> i16: {prod:?}");

    // Comparison against a reversed view.
    let xs = [1i32, 5, 3, 8];
    let mut gt = [false; 4];
    let ctx = TaskContext::new(&config)
        .with_input(ArrayV::new(&xs[..], Layout::contiguous(&[4]))?)
        .with_input(ArrayV::new(&xs[..], Layout::new(vec![4], vec![-1], 3))?)
        .with_output(ArrayVMut::new(&mut gt[..], Layout::contiguous(&[4]))?)
        .with_scalar(Scalar::from(BinaryOpCode::Greater));
    variant(ctx)?;
    println!("\nxs > reversed(xs): {gt:?}");

    // Integer division by zero is reported, not silently produced.
    let num = [9i64, 8, 7];
    let den = [3i64, 0, 1];
    let mut q = [0i64; 3];
    let ctx = TaskContext::new(&config)
        .with_input(ArrayV::new(&num[..], Layout::contiguous(&[3]))?)
        .with_input(ArrayV::new(&den[..], Layout::contiguous(&[3]))?)
        .with_output(ArrayVMut::new(&mut q[..], Layout::contiguous(&[3]))?)
        .with_scalar(Scalar::from(BinaryOpCode::Divide));
    match variant(ctx) {
        Err(e @ BinaryOpError::ArithmeticFault { .. }) => println!("\nExpected fault: {e}"),
        other => println!("\nUnexpected result: {other:?}"),
    }

    Ok(())
}
