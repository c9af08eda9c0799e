//! Conway's Game of Life: CPU reference step function, double-buffered
//! generation driver and (feature `fpga`) an OpenCL host launcher for a
//! prebuilt FPGA kernel image.

// ─── Feature modules ─────────────────────────────────────────────────
#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::{record, reset, summary, StageStats, ALLOCS, ALLOC_BYTES};

#[cfg(feature = "memtrace")]
mod memtracer;
#[cfg(feature = "memtrace")]
pub use memtracer::{flush_csv, start, CopyToken, Dir};

#[cfg(feature = "fpga")]
pub mod device;

// ─── Core modules ────────────────────────────────────────────────────
pub mod board;
pub mod config;
pub mod generations;
pub mod pattern;
pub mod rule;
pub mod runner;
pub mod verify;

pub use board::{Board, Cell, ALIVE, DEAD};
pub use generations::DoubleBuffer;
pub use pattern::Pattern;
pub use rule::{live_neighbors, next_state, step};

use std::path::PathBuf;

// ─── Error type ──────────────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum LifeError {
    #[error("OpenCL API error code {0}")]
    Api(i32),
    #[error("invalid board size: {0}")]
    InvalidSize(usize),
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("cell {index} holds {value}, expected 0 or 1")]
    InvalidCell { index: usize, value: i32 },
    #[error("density {0} is outside [0, 1]")]
    InvalidDensity(f64),
    #[error("position ({row}, {col}) is outside a {side}x{side} board")]
    OutOfBounds { row: usize, col: usize, side: usize },
    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),
    #[error("expected exactly one OpenCL platform, found {0}")]
    PlatformCount(usize),
    #[error("expected exactly one OpenCL device, found {0}")]
    DeviceCount(usize),
    #[error("cannot read kernel image {}", .path.display())]
    KernelImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("program build failed: {0}")]
    Build(String),
    #[error("global size {global} is not a multiple of work size {local}")]
    WorkSize { global: usize, local: usize },
    #[error("device diverged from the CPU reference at generation {generation}, cell ({row}, {col})")]
    Diverged { generation: u64, row: usize, col: usize },
    #[error("{0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LifeError>;

#[cfg(feature = "fpga")]
impl From<opencl3::error_codes::ClError> for LifeError {
    #[inline]
    fn from(err: opencl3::error_codes::ClError) -> Self {
        LifeError::Api(err.0)
    }
}

impl From<i32> for LifeError {
    #[inline]
    fn from(code: i32) -> Self {
        LifeError::Api(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_status_codes_become_api_errors() {
        let err = LifeError::from(-5);
        assert!(matches!(err, LifeError::Api(-5)));
        assert_eq!(err.to_string(), "OpenCL API error code -5");
    }

    #[test]
    fn kernel_image_error_names_the_file() {
        let err = LifeError::KernelImage {
            path: PathBuf::from("life.aocx"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "cannot read kernel image life.aocx");
        assert!(std::error::Error::source(&err).is_some());
    }
}
