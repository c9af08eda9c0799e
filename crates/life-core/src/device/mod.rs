//! OpenCL host side for the FPGA `next` kernel.
//!
//! The kernel image is compiled offline; this module only finds the device,
//! moves boards across and dispatches one NDRange per generation.

mod buffer;
mod session;

pub use buffer::{DeviceBoard, EventGuard, InFlight, Queued, Ready, State};
pub use session::FpgaSession;
