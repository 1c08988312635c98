// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **GPU Variant** - *Bulk Launch, One Logical Thread per Element*
//!
//! Launches a 1-D grid where each logical thread owns one output element and
//! steps through the domain with a grid-stride loop, so a capped grid covers
//! any size. Each thread unravels its own linear index against the broadcast
//! strides, and strided views are consumed in place.
//!
//! ## Devices
//! - [`HostDevice`] executes the launch on the host, blocks in parallel when
//!   `parallel_proc` is enabled. It is the device used when no accelerator is
//!   attached and the reference the CUDA device is checked against.
//! - `CudaContext` (feature `cuda`) compiles and caches device kernels through
//!   NVRTC.
//!
//! ## Faults
//! Threads that fault skip their write and record `(index << 8) | code` in a
//! shared slot with an atomic minimum, so the lowest faulting index wins no
//! matter which block ran first.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "parallel_proc")]
use rayon::prelude::*;
use tracing::debug;

use crate::kernels::cursor::{SharedOut, StridedCursor};
use crate::kernels::dispatch::BinaryKernel;
use crate::kernels::functors::ElementOp;
use crate::kernels::variants::cpu::fault_error;
use crate::traits::type_unions::Primitive;
use crate::utils::ceil_div;
use crate::{Backend, BinaryOpError, Fault, StridedV, StridedVMut};

#[cfg(feature = "cuda")]
use crate::kernels::cuda::context::CudaContext;

/// Threads per block ceiling shared by current devices.
pub const MAX_BLOCK_SIZE: u32 = 1024;

/// Grid-size cap. Larger domains are covered by the grid-stride loop.
pub const MAX_GRID_SIZE: u32 = 65_535;

/// Default threads per block.
pub const DEFAULT_BLOCK_SIZE: u32 = 256;

/// 1-D launch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid_dim: u32,
    pub block_dim: u32,
}

impl LaunchConfig {
    /// Geometry for `len` elements with `block_dim` threads per block.
    ///
    /// Fails with `BackendExecutionFailure` for an empty or oversized block.
    pub fn for_elements(len: usize, block_dim: u32) -> Result<Self, BinaryOpError> {
        if block_dim == 0 || block_dim > MAX_BLOCK_SIZE {
            return Err(BinaryOpError::backend(
                Backend::Gpu,
                format!("invalid block size {block_dim} (expected 1..={MAX_BLOCK_SIZE})"),
            ));
        }
        let blocks = ceil_div(len, block_dim as usize).clamp(1, MAX_GRID_SIZE as usize);
        Ok(Self {
            grid_dim: blocks as u32,
            block_dim,
        })
    }

    /// Total logical threads, which is also the grid-stride step.
    #[inline]
    pub fn threads(&self) -> usize {
        self.grid_dim as usize * self.block_dim as usize
    }
}

/// Lowest faulting index across all threads of a launch.
#[derive(Debug)]
pub(crate) struct FaultSlot(AtomicU64);

impl FaultSlot {
    pub(crate) const EMPTY: u64 = u64::MAX;

    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(Self::EMPTY))
    }

    #[inline]
    pub(crate) fn record(&self, index: usize, fault: Fault) {
        self.0
            .fetch_min(((index as u64) << 8) | fault.code() as u64, Ordering::Relaxed);
    }

    /// Decodes a packed slot value, as written here or by a device kernel.
    pub(crate) fn decode(raw: u64) -> Option<(usize, Fault)> {
        if raw == Self::EMPTY {
            return None;
        }
        Fault::from_code((raw & 0xff) as u8).map(|f| ((raw >> 8) as usize, f))
    }

    pub(crate) fn take(self) -> Option<(usize, Fault)> {
        Self::decode(self.0.into_inner())
    }
}

/// Host-executed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostDevice {
    block_size: u32,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl HostDevice {
    /// Device with `block_size` threads per block. Checked at launch.
    pub fn new(block_size: u32) -> Self {
        Self { block_size }
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Runs one launch of `op` over the output domain.
    pub fn launch<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        let len = out.len();
        let cfg = LaunchConfig::for_elements(len, self.block_size)?;
        debug!(
            device = "host",
            grid = cfg.grid_dim,
            block = cfg.block_dim,
            elements = len,
            "launching kernel"
        );
        if len == 0 {
            return Ok(());
        }

        let (data, layout) = out.into_parts();
        let cursor = StridedCursor::new(layout.shape(), [lhs.layout(), rhs.layout(), &layout]);
        let (l, r) = (lhs.data(), rhs.data());
        let shared = SharedOut::new(data);
        let slot = FaultSlot::new();
        let step = cfg.threads();

        let run_block = |block: u32| {
            for thread in 0..cfg.block_dim {
                let mut gid = block as usize * cfg.block_dim as usize + thread as usize;
                while gid < len {
                    let [li, ri, oi] = cursor.offsets_at(gid);
                    match op.apply(l[li], r[ri]) {
                        // Each gid maps to its own element of a non-aliasing view.
                        Ok(value) => unsafe { shared.write(oi, value) },
                        Err(fault) => slot.record(gid, fault),
                    }
                    gid += step;
                }
            }
        };
        #[cfg(feature = "parallel_proc")]
        (0..cfg.grid_dim).into_par_iter().for_each(run_block);
        #[cfg(not(feature = "parallel_proc"))]
        (0..cfg.grid_dim).for_each(run_block);

        match slot.take() {
            Some((index, fault)) => Err(fault_error::<T, Op>(fault, index)),
            None => Ok(()),
        }
    }
}

/// Device the GPU variant launches on.
#[derive(Debug, Clone)]
pub enum GpuDevice {
    Host(HostDevice),
    #[cfg(feature = "cuda")]
    Cuda(CudaContext),
}

impl GpuDevice {
    pub fn name(&self) -> &'static str {
        match self {
            GpuDevice::Host(_) => "host",
            #[cfg(feature = "cuda")]
            GpuDevice::Cuda(_) => "cuda",
        }
    }
}

/// GPU-variant kernel bound to a device.
#[derive(Debug, Clone, Copy)]
pub struct GpuKernel<'d> {
    device: &'d GpuDevice,
}

impl<'d> GpuKernel<'d> {
    pub fn new(device: &'d GpuDevice) -> Self {
        Self { device }
    }
}

impl BinaryKernel for GpuKernel<'_> {
    fn backend(&self) -> Backend {
        Backend::Gpu
    }

    fn run<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        match self.device {
            GpuDevice::Host(host) => host.launch(lhs, rhs, out, op),
            #[cfg(feature = "cuda")]
            GpuDevice::Cuda(cuda) => cuda.launch(lhs, rhs, out, op),
        }
    }
}
