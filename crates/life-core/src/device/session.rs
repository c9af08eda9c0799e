use std::fs;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "memtrace")]
use crate::memtracer::{start, Dir};

use opencl3::{
    command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE},
    context::Context,
    device::{Device, CL_DEVICE_TYPE_ALL},
    error_codes::CL_DEVICE_NOT_FOUND,
    kernel::{ExecuteKernel, Kernel},
    platform::get_platforms,
    program::Program,
    types::cl_int,
};
use tracing::{debug, info};

use super::buffer::{DeviceBoard, EventGuard, Queued, Ready};
use crate::board::Board;
use crate::config::{self, DeviceConfig};
use crate::verify::Lockstep;
use crate::{LifeError, Result};

/// Context, queue and the bound `next(in, out, dim)` kernel of the one
/// accelerator in the system.
pub struct FpgaSession {
    device_name: String,
    context: Context,
    queue: CommandQueue,
    kernel: Kernel,
    _program: Program,
    work_size: usize,
}

impl std::fmt::Debug for FpgaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FpgaSession")
            .field("device_name", &self.device_name)
            .field("work_size", &self.work_size)
            .finish_non_exhaustive()
    }
}

impl FpgaSession {
    /// Finds the platform and device, then builds the program from the
    /// offline-compiled kernel image. Exactly one platform and one device
    /// are accepted.
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        /* ---------- 1. platform & device ---------- */
        let platforms = get_platforms()?;
        if platforms.len() != 1 {
            return Err(LifeError::PlatformCount(platforms.len()));
        }
        let platform = &platforms[0];
        info!(platform = %platform.name().unwrap_or_default(), "using OpenCL platform");

        let device_ids = match platform.get_devices(CL_DEVICE_TYPE_ALL) {
            Ok(ids) => ids,
            Err(e) if e.0 == CL_DEVICE_NOT_FOUND => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if device_ids.len() != 1 {
            return Err(LifeError::DeviceCount(device_ids.len()));
        }
        let device = Device::new(device_ids[0]);
        let device_name = device.name().unwrap_or_default().trim().to_string();
        info!(device = %device_name, "using OpenCL device");

        /* ---------- 2. context & queue ---------- */
        let context = Context::from_device(&device)?;
        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&context, CL_QUEUE_PROFILING_ENABLE)?;

        /* ---------- 3. kernel image ---------- */
        let image = fs::read(&config.kernel_image).map_err(|source| LifeError::KernelImage {
            path: config.kernel_image.clone(),
            source,
        })?;
        info!(path = %config.kernel_image.display(), bytes = image.len(), "loaded kernel image");

        let program = Program::create_and_build_from_binary(&context, &[&image[..]], "")
            .map_err(LifeError::Build)?;
        let kernel = Kernel::create(&program, &config.kernel_name)?;
        info!(kernel = %config.kernel_name, work_size = config.work_size, "kernel initialization is complete");

        Ok(Self {
            device_name,
            context,
            queue,
            kernel,
            _program: program,
            work_size: config.work_size,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn work_size(&self) -> usize {
        self.work_size
    }

    fn check_work_size(&self, side: usize) -> Result<usize> {
        config::check_work_size(side, self.work_size)
    }

    /// Allocates an uninitialised device board.
    pub fn alloc(&self, side: usize) -> Result<DeviceBoard<Queued>> {
        DeviceBoard::new(&self.context, side)
    }

    pub fn upload(&self, board: &Board) -> Result<DeviceBoard<Ready>> {
        self.check_work_size(board.side())?;
        let (in_flight, guard) = self.alloc(board.side())?.enqueue_write(&self.queue, board)?;
        in_flight.into_ready(guard)
    }

    pub fn download(&self, src: &mut DeviceBoard<Ready>, board: &mut Board) -> Result<()> {
        src.read_into(&self.queue, board)
    }

    /// One generation on the device: `src` → `dst`.
    pub fn step(&self, src: &DeviceBoard<Ready>, dst: DeviceBoard<Queued>) -> Result<DeviceBoard<Ready>> {
        if src.side() != dst.side() {
            return Err(LifeError::SizeMismatch {
                expected: src.len(),
                actual: dst.len(),
            });
        }
        let side = src.side();
        let global = self.check_work_size(side)?;
        let dim = cl_int::try_from(side).map_err(|_| LifeError::InvalidSize(side))?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        #[cfg(feature = "memtrace")]
        let token = start(Dir::Kernel, 0);

        // SAFETY: argument order and types match `next(int*, int*, int)`; both
        // buffers hold side*side cl_ints and live until the event is waited on.
        let evt = unsafe {
            ExecuteKernel::new(&self.kernel)
                .set_arg(src.raw())
                .set_arg(dst.raw())
                .set_arg(&dim)
                .set_global_work_size(global)
                .set_local_work_size(self.work_size)
                .enqueue_nd_range(&self.queue)?
        };

        #[cfg(feature = "metrics")]
        crate::metrics::record("kernel_launch", t);

        let guard = EventGuard::new(evt);
        #[cfg(feature = "memtrace")]
        let guard = guard.traced(token);

        dst.launch().into_ready(guard)
    }

    /// Runs `generations` steps, ping-ponging two device boards, and returns
    /// the final board. `observer` sees each generation before it is stepped.
    pub fn run<F>(&self, initial: &Board, generations: u64, mut observer: F) -> Result<Board>
    where
        F: FnMut(u64, &mut DeviceBoard<Ready>) -> Result<()>,
    {
        let mut current = self.upload(initial)?;
        let mut spare = self.alloc(initial.side())?;

        for generation in 0..generations {
            observer(generation, &mut current)?;
            let next = self.step(&current, spare)?;
            spare = std::mem::replace(&mut current, next).recycle();
            debug!(generation = generation + 1, "kernel execution is complete");
        }

        let mut out = initial.empty_like();
        self.download(&mut current, &mut out)?;
        Ok(out)
    }

    /// Like [`run`](Self::run), but every device generation is read back and
    /// compared with the CPU reference; the first difference is an error.
    /// `observer` sees each verified host copy, as in [`DoubleBuffer::run`].
    ///
    /// [`DoubleBuffer::run`]: crate::generations::DoubleBuffer::run
    pub fn run_verified<F>(&self, initial: &Board, generations: u64, mut observer: F) -> Result<Board>
    where
        F: FnMut(u64, &Board),
    {
        let mut lockstep = Lockstep::new(initial);
        let mut host = initial.empty_like();

        let last = self.run(initial, generations, |generation, current| {
            self.download(current, &mut host)?;
            lockstep.check_and_advance(&host)?;
            observer(generation, &host);
            Ok(())
        })?;
        lockstep.check(&last)?;
        info!(generations = lockstep.generation(), "verification succeeded");
        Ok(last)
    }
}
