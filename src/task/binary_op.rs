// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Binary-Op Task** - *Runtime Entry Points*
//!
//! One entry point per execution variant, each with the uniform signature
//! `fn(TaskContext) -> Result<(), BinaryOpError>` the runtime stores in its
//! task table. All three unpack the context the same way and differ only in
//! the kernel handed to [`execute`].

use tracing::{debug, debug_span, field};

use crate::kernels::dispatch::{BinaryKernel, execute};
use crate::kernels::variants::cpu::CpuKernel;
use crate::kernels::variants::gpu::GpuKernel;
#[cfg(feature = "parallel_proc")]
use crate::kernels::variants::omp::OmpKernel;
use crate::task::registry::TaskRecord;
use crate::{BinaryOpArgs, BinaryOpError, TaskContext, TaskId};

/// Stable task identifier the runtime schedules binary ops under.
pub const BINARY_OP_TASK_ID: TaskId = 2;

/// Entry points of the elementwise binary-operation task.
#[derive(Debug, Clone, Copy)]
pub struct BinaryOpTask;

impl BinaryOpTask {
    pub const NAME: &'static str = "binary_op";

    /// Single-threaded CPU entry point.
    pub fn cpu_variant(ctx: TaskContext<'_>) -> Result<(), BinaryOpError> {
        invoke(ctx, |_| CpuKernel)
    }

    /// Multithreaded CPU entry point, on the config's worker pool.
    #[cfg(feature = "parallel_proc")]
    pub fn omp_variant(ctx: TaskContext<'_>) -> Result<(), BinaryOpError> {
        invoke(ctx, |ctx| OmpKernel::new(ctx.config()))
    }

    /// GPU entry point, on the config's device.
    pub fn gpu_variant(ctx: TaskContext<'_>) -> Result<(), BinaryOpError> {
        invoke(ctx, |ctx| GpuKernel::new(ctx.config().gpu()))
    }

    /// Registry record for this task. The multithreaded slot is empty when
    /// the crate is built without `parallel_proc`.
    pub fn record() -> TaskRecord {
        TaskRecord {
            task_id: BINARY_OP_TASK_ID,
            name: Self::NAME,
            cpu: Self::cpu_variant,
            #[cfg(feature = "parallel_proc")]
            omp: Some(Self::omp_variant),
            #[cfg(not(feature = "parallel_proc"))]
            omp: None,
            gpu: Some(Self::gpu_variant),
        }
    }
}

fn invoke<'a, K: BinaryKernel>(
    ctx: TaskContext<'a>,
    kernel: impl FnOnce(&TaskContext<'a>) -> K,
) -> Result<(), BinaryOpError> {
    let kernel = kernel(&ctx);
    let span = debug_span!("binary_op", backend = %kernel.backend(), op = field::Empty);
    let _guard = span.enter();

    let result = BinaryOpArgs::try_from(ctx).and_then(|args| {
        span.record("op", args.op.name());
        execute(args, &kernel)
    });
    if let Err(e) = &result {
        debug!(error = %e, "binary op failed");
    }
    result
}
