// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Backend Module
//!
//! Hardware backends a task variant can target, and the availability flags
//! the runtime hands over to pick one. The crate never probes hardware.

use std::fmt;

/// Execution substrate for one task variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// Single-threaded CPU.
    Cpu,
    /// Multithreaded CPU.
    Omp,
    /// Bulk kernel launch on a GPU device.
    Gpu,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Cpu, Backend::Omp, Backend::Gpu];

    /// Picks the preferred backend the runtime has enabled.
    ///
    /// GPU first, then multithreaded CPU, then the single-threaded fallback,
    /// which is always available.
    pub fn select(available: &BackendAvailability) -> Backend {
        if available.gpu {
            Backend::Gpu
        } else if available.multithreading {
            Backend::Omp
        } else {
            Backend::Cpu
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Omp => "omp",
            Backend::Gpu => "gpu",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-backend availability flags supplied by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendAvailability {
    /// Is multithreading enabled for this process?
    pub multithreading: bool,
    /// Is a GPU device present and assigned?
    pub gpu: bool,
}
