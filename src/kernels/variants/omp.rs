// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Multithreaded CPU Variant** - *Chunked Parallel Elementwise Loop*
//!
//! Splits the linear output domain into disjoint contiguous chunks, one per
//! worker and never below the configured minimum chunk length, and runs the
//! single-threaded loop body on each with `rayon`.
//!
//! - Contiguous outputs are split with `par_chunks_mut`.
//! - Strided outputs are written through a shared pointer. Chunks cover
//!   disjoint linear ranges and an output view never maps two indices to the
//!   same element, so writes never collide.
//! - When several chunks fault, the fault with the lowest linear index wins,
//!   matching what the single-threaded loop reports.

use rayon::prelude::*;
use tracing::debug;

use crate::kernels::cursor::SharedOut;
use crate::kernels::dispatch::BinaryKernel;
use crate::kernels::functors::ElementOp;
use crate::kernels::variants::cpu::{apply_range, fault_error};
use crate::traits::type_unions::Primitive;
use crate::utils::ceil_div;
use crate::{Backend, BinaryOpError, ExecutionConfig, Fault, StridedV, StridedVMut};

/// Multithreaded kernel bound to an execution config.
#[derive(Debug, Clone, Copy)]
pub struct OmpKernel<'c> {
    config: &'c ExecutionConfig,
    chunks: Option<usize>,
}

impl<'c> OmpKernel<'c> {
    pub fn new(config: &'c ExecutionConfig) -> Self {
        Self {
            config,
            chunks: None,
        }
    }

    /// Forces exactly `chunks` chunks (at least one), ignoring the worker
    /// count and minimum chunk length.
    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = Some(chunks.max(1));
        self
    }

    /// Elements per chunk for a domain of `len` elements.
    pub fn chunk_len(&self, len: usize) -> usize {
        match self.chunks {
            Some(n) => ceil_div(len, n).max(1),
            None => ceil_div(len, self.config.worker_count())
                .max(self.config.min_chunk_len())
                .max(1),
        }
    }
}

impl BinaryKernel for OmpKernel<'_> {
    fn backend(&self) -> Backend {
        Backend::Omp
    }

    fn run<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        let len = out.len();
        if len == 0 {
            return Ok(());
        }
        let chunk = self.chunk_len(len);
        let contiguous = out.layout().is_contiguous();
        debug!(
            elements = len,
            chunk_len = chunk,
            chunks = ceil_div(len, chunk),
            contiguous,
            "partitioned output domain"
        );

        let (data, layout) = out.into_parts();
        let (lhs, rhs, layout) = (&lhs, &rhs, &layout);
        let first_fault = self.config.install(|| -> Option<(usize, Fault)> {
            if contiguous {
                let base = layout.offset();
                data[base..base + len]
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .filter_map(|(c, slice)| {
                        let start = c * chunk;
                        apply_range(lhs, rhs, layout, start, slice.len(), op, |i, _, value| {
                            slice[i - start] = value;
                        })
                        .err()
                    })
                    .min_by_key(|&(index, _)| index)
            } else {
                let shared = SharedOut::new(data);
                (0..ceil_div(len, chunk))
                    .into_par_iter()
                    .filter_map(|c| {
                        let start = c * chunk;
                        let n = chunk.min(len - start);
                        apply_range(lhs, rhs, layout, start, n, op, |_, at, value| {
                            // Chunks own disjoint index ranges of a non-aliasing view.
                            unsafe { shared.write(at, value) }
                        })
                        .err()
                    })
                    .min_by_key(|&(index, _)| index)
            }
        })?;

        match first_fault {
            Some((index, fault)) => Err(fault_error::<T, Op>(fault, index)),
            None => Ok(()),
        }
    }
}
