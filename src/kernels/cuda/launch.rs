// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # CUDA Launch
//!
//! Compiles one device module per `(operation, element type)` through NVRTC,
//! caches it per device, and runs it over device copies of the operand
//! buffers. Layout metadata travels as a single `i64` array so the kernel
//! consumes the same strided views the host variants do.
//!
//! Transcendental results (`power`, `arctan2`, `hypot` on floats) come from
//! the device math library and may differ from the host in the last ulp.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::OnceLock;

use cudarc::driver::{LaunchAsync, LaunchConfig as DeviceLaunchConfig};
use parking_lot::Mutex;
use tracing::debug;

use crate::kernels::cuda::context::CudaContext;
use crate::kernels::functors::ElementOp;
use crate::kernels::variants::cpu::fault_error;
use crate::kernels::variants::gpu::{DEFAULT_BLOCK_SIZE, FaultSlot, LaunchConfig};
use crate::traits::type_unions::Primitive;
use crate::{Backend, BinaryOpError, DType, StridedV, StridedVMut};

const KERNEL_SOURCE: &str = include_str!("kernels/binary_op.cu");
const KERNEL_NAME: &str = "binary_op";

/// Modules already loaded, keyed by `(device ordinal, module name)`.
static LOADED: OnceLock<Mutex<HashSet<(usize, String)>>> = OnceLock::new();

fn loaded_set() -> &'static Mutex<HashSet<(usize, String)>> {
    LOADED.get_or_init(|| Mutex::new(HashSet::new()))
}

fn driver_error(what: &str, e: impl Display) -> BinaryOpError {
    BinaryOpError::backend(Backend::Gpu, format!("{what}: {e}"))
}

/// C spelling of each element type inside the kernel source.
fn c_type(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "bool",
        DType::Int8 => "signed char",
        DType::Int16 => "short",
        DType::Int32 => "int",
        DType::Int64 => "long long",
        DType::UInt8 => "unsigned char",
        DType::UInt16 => "unsigned short",
        DType::UInt32 => "unsigned int",
        DType::UInt64 => "unsigned long long",
        DType::Float32 => "float",
        DType::Float64 => "double",
    }
}

/// Kernel source specialised for `Op` over `T`.
fn module_source<T: Primitive, Op: ElementOp<T>>() -> String {
    format!(
        "#define ELEM {}\n#define OUT {}\n#define APPLY op_{}\n{}",
        c_type(T::DTYPE),
        c_type(<Op::Output as Primitive>::DTYPE),
        Op::OP.name(),
        KERNEL_SOURCE
    )
}

/// `shape, lhs strides, rhs strides, out strides, offsets`, flattened.
fn layout_meta(views: [&crate::Layout; 3]) -> Vec<i64> {
    let shape = views[2].shape();
    let mut meta = Vec::with_capacity(4 * shape.len() + 3);
    meta.extend(shape.iter().map(|&d| d as i64));
    for layout in views {
        meta.extend(layout.strides().iter().map(|&s| s as i64));
    }
    meta.extend(views.iter().map(|l| l.offset() as i64));
    meta
}

impl CudaContext {
    /// Loads the module for `Op` over `T` on this device unless already loaded.
    fn ensure_module<T: Primitive, Op: ElementOp<T>>(&self) -> Result<String, BinaryOpError> {
        let name = format!("binary_{}_{}", Op::OP.name(), T::DTYPE.name());
        let key = (self.ordinal(), name.clone());
        let mut set = loaded_set().lock();
        if set.contains(&key) {
            return Ok(name);
        }
        debug!(ordinal = self.ordinal(), module = %name, "compiling device module");
        let ptx = cudarc::nvrtc::compile_ptx(module_source::<T, Op>())
            .map_err(|e| driver_error(&format!("compiling {name}"), e))?;
        self.device()
            .load_ptx(ptx, &name, &[KERNEL_NAME])
            .map_err(|e| driver_error(&format!("loading {name}"), e))?;
        set.insert(key);
        Ok(name)
    }

    /// Runs one launch of `op` over the output domain on this device.
    pub fn launch<T: Primitive, Op: ElementOp<T>>(
        &self,
        lhs: StridedV<'_, T>,
        rhs: StridedV<'_, T>,
        out: StridedVMut<'_, Op::Output>,
        op: Op,
    ) -> Result<(), BinaryOpError> {
        let len = out.len();
        let cfg = LaunchConfig::for_elements(len, DEFAULT_BLOCK_SIZE)?;
        debug!(
            device = "cuda",
            ordinal = self.ordinal(),
            grid = cfg.grid_dim,
            block = cfg.block_dim,
            elements = len,
            "launching kernel"
        );
        if len == 0 {
            return Ok(());
        }

        let module = self.ensure_module::<T, Op>()?;
        let func = self
            .device()
            .get_func(&module, KERNEL_NAME)
            .ok_or_else(|| driver_error("missing kernel", format!("{module}::{KERNEL_NAME}")))?;

        let (data, layout) = out.into_parts();
        let meta = layout_meta([lhs.layout(), rhs.layout(), &layout]);
        let rank = layout.rank() as i32;
        let [p0, p1] = op.params();

        let dev = self.device();
        let d_lhs = dev.htod_sync_copy(lhs.data()).map_err(|e| driver_error("copying lhs", e))?;
        let d_rhs = dev.htod_sync_copy(rhs.data()).map_err(|e| driver_error("copying rhs", e))?;
        let d_meta = dev.htod_sync_copy(&meta).map_err(|e| driver_error("copying layout", e))?;
        // Seeded with the current contents so elements outside the view survive.
        let mut d_out = dev.htod_sync_copy(&*data).map_err(|e| driver_error("copying output", e))?;
        let mut d_fault = dev
            .htod_sync_copy(&[FaultSlot::EMPTY])
            .map_err(|e| driver_error("allocating fault slot", e))?;

        let launch = DeviceLaunchConfig {
            grid_dim: (cfg.grid_dim, 1, 1),
            block_dim: (cfg.block_dim, 1, 1),
            shared_mem_bytes: 0,
        };
        unsafe {
            func.launch(
                launch,
                (
                    &d_lhs,
                    &d_rhs,
                    &mut d_out,
                    &d_meta,
                    rank,
                    len as u64,
                    p0,
                    p1,
                    &mut d_fault,
                ),
            )
        }
        .map_err(|e| driver_error("launching kernel", e))?;

        dev.dtoh_sync_copy_into(&d_out, data)
            .map_err(|e| driver_error("copying output back", e))?;
        let fault = dev
            .dtoh_sync_copy(&d_fault)
            .map_err(|e| driver_error("reading fault slot", e))?;

        match fault.first().copied().and_then(FaultSlot::decode) {
            Some((index, fault)) => Err(fault_error::<T, Op>(fault, index)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::functors::{Divide, IsClose, Power};
    use crate::{Fault, HostDevice, Layout};

    #[test]
    fn test_module_source_defines_types() {
        let src = module_source::<i16, Divide>();
        assert!(src.starts_with("#define ELEM short\n#define OUT short\n#define APPLY op_divide\n"));
        let src = module_source::<f32, IsClose>();
        assert!(src.contains("#define OUT bool\n#define APPLY op_isclose"));
    }

    #[test]
    fn test_layout_meta_order() {
        let out = Layout::contiguous(&[2, 3]);
        let lhs = Layout::contiguous(&[3]).broadcast_to(&[2, 3]).unwrap();
        let rhs = Layout::new(vec![2, 3], vec![1, 2], 4);
        assert_eq!(
            layout_meta([&lhs, &rhs, &out]),
            vec![2, 3, 0, 1, 1, 2, 3, 1, 0, 4, 0]
        );
    }

    #[test]
    fn test_device_matches_host() {
        let Ok(ctx) = CudaContext::new(0) else {
            return;
        };
        let a: Vec<i32> = (-50..50).collect();
        let b: Vec<i32> = (0..100).map(|x| x % 7).collect();
        let l = Layout::contiguous(&[10, 10]);
        let mut host = vec![0i32; 100];
        let mut dev = vec![0i32; 100];
        let host_err = HostDevice::default().launch(
            StridedV::new(&a, l.clone()).unwrap(),
            StridedV::new(&b, l.clone()).unwrap(),
            StridedVMut::new(&mut host, l.clone()).unwrap(),
            Power,
        );
        let dev_err = ctx.launch(
            StridedV::new(&a, l.clone()).unwrap(),
            StridedV::new(&b, l.clone()).unwrap(),
            StridedVMut::new(&mut dev, l).unwrap(),
            Power,
        );
        assert_eq!(host_err, dev_err);
        assert_eq!(host, dev);

        let zero = vec![0i32; 100];
        let mut o = vec![0i32; 100];
        let err = ctx
            .launch(
                StridedV::new(&a, Layout::contiguous(&[100])).unwrap(),
                StridedV::new(&zero, Layout::contiguous(&[100])).unwrap(),
                StridedVMut::new(&mut o, Layout::contiguous(&[100])).unwrap(),
                Divide,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            BinaryOpError::ArithmeticFault { fault: Fault::DivideByZero, index: 0, .. }
        ));
    }
}
