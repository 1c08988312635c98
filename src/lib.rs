// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # binop - *Elementwise Binary-Operation Task*
//!
//! Computes `out = op(in1, in2)` over two strided, possibly broadcast,
//! partition-local array views, for a runtime that schedules the work.
//!
//! ## Layout
//! - `enums` - element type tags, operation codes, scalars, backends and errors.
//! - `structs` - view layouts, typed and type-erased views, the argument bundle,
//!   the task context and execution config.
//! - `kernels` - the operation registry, per-element functors, promotion,
//!   type dispatch and the three execution variants.
//! - `task` - the task entry points and the `(task id, backend)` registry.
//!
//! ## Example
//! ```rust
//! use binop::{ArrayV, ArrayVMut, BinaryOpCode, BinaryOpTask, ExecutionConfig, Layout, Scalar, TaskContext};
//!
//! let lhs = [1i32, 2, 3];
//! let rhs = [10i32];
//! let mut out = [0i32; 3];
//!
//! let config = ExecutionConfig::default();
//! let ctx = TaskContext::new(&config)
//!     .with_input(ArrayV::new(&lhs[..], Layout::contiguous(&[3])).unwrap())
//!     .with_input(ArrayV::new(&rhs[..], Layout::contiguous(&[1])).unwrap())
//!     .with_output(ArrayVMut::new(&mut out[..], Layout::contiguous(&[3])).unwrap())
//!     .with_scalar(Scalar::from(BinaryOpCode::Add));
//!
//! BinaryOpTask::cpu_variant(ctx).unwrap();
//! assert_eq!(out, [11, 12, 13]);
//! ```

pub mod enums {
    pub mod backend;
    pub mod dtype;
    pub mod error;
    pub mod op_code;
    pub mod scalar;
}

pub mod structs {
    pub mod args;
    pub mod config;
    pub mod host_buffer;
    pub mod layout;
    pub mod task_context;
    pub mod views;
}

pub mod traits {
    pub mod type_unions;
}

pub mod kernels {
    pub mod cursor;
    pub mod dispatch;
    pub mod functors;
    pub mod promotion;
    pub mod registry;
    pub mod variants {
        pub mod cpu;
        pub mod gpu;
        #[cfg(feature = "parallel_proc")]
        pub mod omp;
    }
    #[cfg(feature = "cuda")]
    pub mod cuda {
        pub mod context;
        pub mod launch;
    }
}

pub mod task {
    pub mod binary_op;
    pub mod registry;
}

pub mod aliases;
pub mod utils;

pub use aliases::{Offset, Stride, TaskId};

pub use enums::backend::{Backend, BackendAvailability};
pub use enums::dtype::DType;
pub use enums::error::{BinaryOpError, Fault, RegistryError};
pub use enums::op_code::BinaryOpCode;
pub use enums::scalar::Scalar;

pub use structs::args::BinaryOpArgs;
pub use structs::config::ExecutionConfig;
pub use structs::host_buffer::HostBuffer;
pub use structs::layout::{Layout, MAX_DIM};
pub use structs::task_context::TaskContext;
pub use structs::views::{ArrayV, ArrayVMut, StridedV, StridedVMut};

#[cfg(feature = "cuda")]
pub use kernels::cuda::context::CudaContext;
pub use kernels::dispatch::{BinaryKernel, execute};
pub use kernels::functors::{Arithmetic, ElementOp};
pub use kernels::registry::{OpInfo, OperandDomain, ResultRule};
pub use kernels::variants::cpu::CpuKernel;
pub use kernels::variants::gpu::{GpuDevice, GpuKernel, HostDevice, LaunchConfig};
#[cfg(feature = "parallel_proc")]
pub use kernels::variants::omp::OmpKernel;

pub use task::binary_op::{BINARY_OP_TASK_ID, BinaryOpTask};
pub use task::registry::{TaskRecord, TaskRegistry, TaskRegistryBuilder, VariantFn, register_tasks};

pub use traits::type_unions::{Float, Integer, Numeric, Primitive};
