// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Execution Config
//!
//! Per-process knobs for the execution variants, handed to every invocation
//! through the [`TaskContext`](crate::TaskContext).
//!
//! ## Environment overrides
//! [`ExecutionConfig::from_env`] starts from the defaults and applies:
//! - `BINOP_NUM_THREADS` - worker count for the multithreaded variant;
//! - `BINOP_MIN_CHUNK_LEN` - smallest per-worker chunk, in elements;
//! - `BINOP_GPU_BLOCK_SIZE` - threads per block on the host device;
//! - `BINOP_CUDA_DEVICE` - CUDA ordinal, selecting the CUDA device (feature `cuda`).
//!
//! Values that fail to parse are logged and ignored.

#[cfg(feature = "parallel_proc")]
use std::sync::OnceLock;

#[cfg(feature = "cuda")]
use tracing::warn;

use crate::utils::env_override;
use crate::{GpuDevice, HostDevice};
#[cfg(feature = "parallel_proc")]
use crate::{Backend, BinaryOpError};

/// Default smallest chunk handed to one worker.
pub const DEFAULT_MIN_CHUNK_LEN: usize = 4096;

/// # ExecutionConfig
///
/// Thread, chunking and device settings.
///
/// With `num_threads` set, the multithreaded variant runs on a dedicated
/// pool built on first use and reused for the config's lifetime. Otherwise
/// it runs on the global rayon pool.
#[derive(Debug)]
pub struct ExecutionConfig {
    num_threads: Option<usize>,
    min_chunk_len: usize,
    gpu: GpuDevice,
    #[cfg(feature = "parallel_proc")]
    pool: OnceLock<Result<rayon::ThreadPool, String>>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_len: DEFAULT_MIN_CHUNK_LEN,
            gpu: GpuDevice::Host(HostDevice::default()),
            #[cfg(feature = "parallel_proc")]
            pool: OnceLock::new(),
        }
    }
}

impl Clone for ExecutionConfig {
    /// Clones the settings. The clone builds its own pool on first use.
    fn clone(&self) -> Self {
        Self {
            num_threads: self.num_threads,
            min_chunk_len: self.min_chunk_len,
            gpu: self.gpu.clone(),
            #[cfg(feature = "parallel_proc")]
            pool: OnceLock::new(),
        }
    }
}

impl ExecutionConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_override::<usize>("BINOP_NUM_THREADS") {
            config.num_threads = Some(n.max(1));
        }
        if let Some(n) = env_override::<usize>("BINOP_MIN_CHUNK_LEN") {
            config.min_chunk_len = n.max(1);
        }
        if let Some(n) = env_override::<u32>("BINOP_GPU_BLOCK_SIZE") {
            config.gpu = GpuDevice::Host(HostDevice::new(n));
        }
        #[cfg(feature = "cuda")]
        {
            if let Some(ordinal) = env_override::<usize>("BINOP_CUDA_DEVICE") {
                match crate::kernels::cuda::context::CudaContext::new(ordinal) {
                    Ok(ctx) => config.gpu = GpuDevice::Cuda(ctx),
                    Err(e) => {
                        warn!(ordinal, error = %e, "CUDA device unavailable, keeping host device")
                    }
                }
            }
        }
        config
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n.max(1));
        #[cfg(feature = "parallel_proc")]
        {
            self.pool = OnceLock::new();
        }
        self
    }

    pub fn with_min_chunk_len(mut self, n: usize) -> Self {
        self.min_chunk_len = n.max(1);
        self
    }

    pub fn with_gpu(mut self, gpu: GpuDevice) -> Self {
        self.gpu = gpu;
        self
    }

    #[inline]
    pub fn num_threads(&self) -> Option<usize> {
        self.num_threads
    }

    #[inline]
    pub fn min_chunk_len(&self) -> usize {
        self.min_chunk_len
    }

    #[inline]
    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    /// Workers the multithreaded variant partitions across.
    #[cfg(feature = "parallel_proc")]
    pub fn worker_count(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Runs `f` on this config's pool, or the global pool when no thread
    /// count is set.
    #[cfg(feature = "parallel_proc")]
    pub(crate) fn install<R: Send>(
        &self,
        f: impl FnOnce() -> R + Send,
    ) -> Result<R, BinaryOpError> {
        let Some(threads) = self.num_threads else {
            return Ok(f());
        };
        let pool = self.pool.get_or_init(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("binop-worker-{i}"))
                .build()
                .map_err(|e| e.to_string())
        });
        match pool {
            Ok(pool) => Ok(pool.install(f)),
            Err(msg) => Err(BinaryOpError::backend(
                Backend::Omp,
                format!("failed to build a {threads}-thread pool: {msg}"),
            )),
        }
    }
}
