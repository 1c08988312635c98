// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # CUDA Context
//!
//! Process-wide cache of `cudarc` device handles, one per ordinal, created on
//! first use and shared by every config that selects that device.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use cudarc::driver::CudaDevice;
use parking_lot::Mutex;

use crate::{Backend, BinaryOpError};

static DEVICES: OnceLock<Mutex<HashMap<usize, Arc<CudaDevice>>>> = OnceLock::new();

fn devices() -> &'static Mutex<HashMap<usize, Arc<CudaDevice>>> {
    DEVICES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Handle to one CUDA device.
#[derive(Clone)]
pub struct CudaContext {
    ordinal: usize,
    device: Arc<CudaDevice>,
}

impl CudaContext {
    /// Opens device `ordinal`, reusing a cached handle when one exists.
    pub fn new(ordinal: usize) -> Result<Self, BinaryOpError> {
        let mut map = devices().lock();
        if let Some(device) = map.get(&ordinal) {
            return Ok(Self {
                ordinal,
                device: Arc::clone(device),
            });
        }
        let device = CudaDevice::new(ordinal).map_err(|e| {
            BinaryOpError::backend(Backend::Gpu, format!("CUDA device {ordinal}: {e}"))
        })?;
        map.insert(ordinal, Arc::clone(&device));
        Ok(Self { ordinal, device })
    }

    /// Whether device `0` can be opened.
    pub fn is_available() -> bool {
        Self::new(0).is_ok()
    }

    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    #[inline]
    pub(crate) fn device(&self) -> &Arc<CudaDevice> {
        &self.device
    }
}

impl fmt::Debug for CudaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaContext")
            .field("ordinal", &self.ordinal)
            .finish_non_exhaustive()
    }
}
