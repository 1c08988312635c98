// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # TaskContext Module
//!
//! What the runtime hands a task variant for one invocation: the input and
//! output views of the local partition, the task-level scalars, and the
//! execution configuration of the calling process.

use crate::{ArrayV, ArrayVMut, ExecutionConfig, Scalar};

/// # TaskContext
///
/// Borrowed operands and parameters for one task invocation.
///
/// ## Conventions for the binary-op task
/// - `inputs`: exactly two views.
/// - `outputs`: exactly one view.
/// - `scalars[0]`: the operation code as `Int32`. The remaining scalars are
///   the operation's extra arguments in order.
#[derive(Debug)]
pub struct TaskContext<'a> {
    pub inputs: Vec<ArrayV<'a>>,
    pub outputs: Vec<ArrayVMut<'a>>,
    pub scalars: Vec<Scalar>,
    config: &'a ExecutionConfig,
}

impl<'a> TaskContext<'a> {
    /// Empty context bound to `config`.
    pub fn new(config: &'a ExecutionConfig) -> Self {
        Self {
            inputs: Vec::with_capacity(2),
            outputs: Vec::with_capacity(1),
            scalars: Vec::new(),
            config,
        }
    }

    pub fn with_input(mut self, view: ArrayV<'a>) -> Self {
        self.inputs.push(view);
        self
    }

    pub fn with_output(mut self, view: ArrayVMut<'a>) -> Self {
        self.outputs.push(view);
        self
    }

    pub fn with_scalar(mut self, scalar: Scalar) -> Self {
        self.scalars.push(scalar);
        self
    }

    #[inline]
    pub fn config(&self) -> &'a ExecutionConfig {
        self.config
    }
}
