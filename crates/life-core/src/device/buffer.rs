// ─── Device board with typestate ─────────────────────────────────────
//
// Queued   : allocated, contents undefined
// InFlight : a transfer or kernel that writes it is enqueued
// Ready    : synchronised, safe to read or use as kernel input

#[cfg(feature = "memtrace")]
use crate::memtracer::{start, CopyToken, Dir};

use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    event::Event,
    memory::{Buffer, CL_MEM_READ_WRITE},
    types::{CL_BLOCKING, CL_NON_BLOCKING},
};
use std::{marker::PhantomData, mem::size_of, ptr};

#[cfg(feature = "metrics")]
use std::{sync::atomic::Ordering, time::Instant};

#[cfg(feature = "metrics")]
use crate::metrics::{record, ALLOCS, ALLOC_BYTES};

use crate::board::{cell_count, Board, Cell};
use crate::{LifeError, Result};

mod sealed {
    pub trait Sealed {}
}

pub trait State: sealed::Sealed {}

pub struct Queued;
impl sealed::Sealed for Queued {}
impl State for Queued {}

pub struct InFlight;
impl sealed::Sealed for InFlight {}
impl State for InFlight {}

pub struct Ready;
impl sealed::Sealed for Ready {}
impl State for Ready {}

/// Owns the OpenCL buffer. Kept separate from [`DeviceBoard`] so state
/// transitions can move it without fighting a `Drop` impl.
struct Allocation {
    buf: Buffer<u8>,
    len: usize,
}

impl Drop for Allocation {
    fn drop(&mut self) {
        #[cfg(feature = "metrics")]
        {
            ALLOCS.fetch_sub(1, Ordering::Relaxed);
            ALLOC_BYTES.fetch_sub(self.len, Ordering::Relaxed);
        }
    }
}

/// One `side × side` board of `cl_int` cells in device memory.
///
/// `Queued` boards may only be written, `InFlight` ones only waited on, and
/// only `Ready` boards can be read back or fed to the kernel:
///
/// ```no_run
/// use life_core::device::{DeviceBoard, FpgaSession, Queued, Ready};
/// use life_core::Board;
///
/// fn generation(
///     session: &FpgaSession,
///     src: &DeviceBoard<Ready>,
///     dst: DeviceBoard<Queued>,
///     host: &mut Board,
/// ) -> life_core::Result<DeviceBoard<Queued>> {
///     let mut next = session.step(src, dst)?;
///     session.download(&mut next, host)?;
///     Ok(next.recycle())
/// }
/// ```
///
/// A freshly allocated board holds no generation yet:
///
/// ```compile_fail
/// use life_core::device::{DeviceBoard, FpgaSession, Queued};
/// use life_core::Board;
///
/// fn read_garbage(session: &FpgaSession, mut fresh: DeviceBoard<Queued>, host: &mut Board) {
///     session.download(&mut fresh, host).unwrap();
/// }
/// ```
///
/// ```compile_fail
/// use life_core::device::{DeviceBoard, Queued};
///
/// fn recycle_twice(fresh: DeviceBoard<Queued>) -> DeviceBoard<Queued> {
///     fresh.recycle()
/// }
/// ```
///
/// A board the kernel is still writing cannot be the next input:
///
/// ```compile_fail
/// use life_core::device::{DeviceBoard, FpgaSession, InFlight, Queued};
///
/// fn race(session: &FpgaSession, src: &DeviceBoard<InFlight>, dst: DeviceBoard<Queued>) {
///     session.step(src, dst).unwrap();
/// }
/// ```
///
/// nor can a `Ready` board be overwritten before it is recycled:
///
/// ```compile_fail
/// use life_core::device::{DeviceBoard, FpgaSession, Ready};
///
/// fn clobber(session: &FpgaSession, src: &DeviceBoard<Ready>, dst: DeviceBoard<Ready>) {
///     session.step(src, dst).unwrap();
/// }
/// ```
pub struct DeviceBoard<S: State> {
    inner: Allocation,
    side: usize,
    _state: PhantomData<S>,
}

impl<S: State> std::fmt::Debug for DeviceBoard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBoard")
            .field("side", &self.side)
            .field("len", &self.inner.len)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

// ── Queued ───────────────────────────────────────────────────────────
impl DeviceBoard<Queued> {
    pub fn new(ctx: &Context, side: usize) -> Result<Self> {
        let len = cell_count(side)? * size_of::<Cell>();

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        // SAFETY: no host pointer is passed, the runtime allocates `len` bytes.
        let buf = unsafe { Buffer::<u8>::create(ctx, CL_MEM_READ_WRITE, len, ptr::null_mut())? };

        #[cfg(feature = "metrics")]
        {
            record("alloc", t);
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            ALLOC_BYTES.fetch_add(len, Ordering::Relaxed);
        }

        Ok(Self {
            inner: Allocation { buf, len },
            side,
            _state: PhantomData,
        })
    }

    /// Non-blocking upload. `board` stays borrowed until the guard is consumed
    /// or dropped.
    pub fn enqueue_write<'h>(
        mut self,
        queue: &CommandQueue,
        board: &'h Board,
    ) -> Result<(DeviceBoard<InFlight>, EventGuard<'h>)> {
        self.check_side(board)?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        #[cfg(feature = "memtrace")]
        let token = start(Dir::H2D, self.inner.len);

        // SAFETY: the host slice outlives the transfer through the guard's lifetime.
        let evt = unsafe {
            queue.enqueue_write_buffer(&mut self.inner.buf, CL_NON_BLOCKING, 0, board.as_bytes(), &[])?
        };

        #[cfg(feature = "metrics")]
        record("enqueue_write", t);

        let guard = EventGuard::new(evt);
        #[cfg(feature = "memtrace")]
        let guard = guard.traced(token);

        Ok((self.transition(), guard))
    }

    /// Marks the board as the target of a kernel that is about to be enqueued.
    #[inline]
    pub fn launch(self) -> DeviceBoard<InFlight> {
        self.transition()
    }
}

// ── InFlight ─────────────────────────────────────────────────────────
impl DeviceBoard<InFlight> {
    /// Waits for the write that put the board in flight.
    pub fn into_ready(self, guard: EventGuard<'_>) -> Result<DeviceBoard<Ready>> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        guard.wait()?;

        #[cfg(feature = "metrics")]
        record("wait", t);

        Ok(self.transition())
    }
}

// ── Ready ────────────────────────────────────────────────────────────
impl DeviceBoard<Ready> {
    /// Blocking download into `board`, which is validated afterwards.
    pub fn read_into(&mut self, queue: &CommandQueue, board: &mut Board) -> Result<()> {
        self.check_side(board)?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        #[cfg(feature = "memtrace")]
        let token = start(Dir::D2H, self.inner.len);

        // SAFETY: blocking read, the host slice is valid for the whole call.
        let evt = unsafe {
            queue.enqueue_read_buffer(&mut self.inner.buf, CL_BLOCKING, 0, board.as_bytes_mut(), &[])?
        };
        evt.wait()?;

        #[cfg(feature = "memtrace")]
        token.finish();
        #[cfg(feature = "metrics")]
        record("enqueue_read", t);

        board.validate()
    }

    /// Gives the buffer back for reuse as a kernel output; contents are stale.
    #[inline]
    pub fn recycle(self) -> DeviceBoard<Queued> {
        self.transition()
    }
}

// ── All states ───────────────────────────────────────────────────────
impl<S: State> DeviceBoard<S> {
    #[inline]
    pub fn raw(&self) -> &Buffer<u8> {
        &self.inner.buf
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    fn check_side(&self, board: &Board) -> Result<()> {
        if board.side() != self.side {
            return Err(LifeError::SizeMismatch {
                expected: self.side * self.side,
                actual: board.len(),
            });
        }
        Ok(())
    }

    fn transition<T: State>(self) -> DeviceBoard<T> {
        DeviceBoard {
            inner: self.inner,
            side: self.side,
            _state: PhantomData,
        }
    }
}

// ── Guard (waits on its event when dropped) ──────────────────────────
pub struct EventGuard<'h> {
    evt: Option<Event>,
    #[cfg(feature = "memtrace")]
    token: Option<CopyToken>,
    _host: PhantomData<&'h [u8]>,
}

impl<'h> EventGuard<'h> {
    pub(crate) fn new(evt: Event) -> Self {
        Self {
            evt: Some(evt),
            #[cfg(feature = "memtrace")]
            token: None,
            _host: PhantomData,
        }
    }

    /// Closes `token` once the event has been waited on.
    #[cfg(feature = "memtrace")]
    pub(crate) fn traced(mut self, token: CopyToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn wait(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        let result = match self.evt.take() {
            Some(evt) => evt.wait().map_err(LifeError::from),
            None => Ok(()),
        };
        #[cfg(feature = "memtrace")]
        if let Some(token) = self.token.take() {
            token.finish();
        }
        result
    }
}

impl Drop for EventGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(error = %e, "event wait failed while dropping guard");
        }
    }
}
