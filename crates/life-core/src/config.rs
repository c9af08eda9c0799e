//! Command-line configuration for the `life` binary.
//!
//! Defaults follow the original host programs: a 256×256 board for the CPU
//! run, 512×512 with a work-group size of 32 for the device, and the kernel
//! image `life.aocx` in the working directory.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};

use crate::board::{self, Board};
use crate::{pattern, LifeError, Result};

pub const DEFAULT_CPU_SIDE: usize = 256;
pub const DEFAULT_FPGA_SIDE: usize = 512;
pub const DEFAULT_WORK_SIZE: usize = 32;
pub const DEFAULT_GENERATIONS: u64 = 1000;
pub const DEFAULT_DENSITY: f64 = 0.25;
pub const DEFAULT_KERNEL_IMAGE: &str = "life.aocx";
pub const DEFAULT_KERNEL_NAME: &str = "next";

#[derive(Debug, Parser)]
#[command(name = "life", version, about = "Game of Life on the CPU or an OpenCL FPGA kernel")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the CPU reference implementation.
    Cpu(CpuArgs),
    /// Run the prebuilt kernel image on the FPGA (needs the `fpga` feature).
    Fpga(FpgaArgs),
}

#[derive(Debug, Args)]
pub struct CpuArgs {
    /// Board side length.
    #[arg(long, default_value_t = DEFAULT_CPU_SIDE)]
    pub size: usize,
    #[command(flatten)]
    pub sim: SimArgs,
}

#[derive(Debug, Args)]
pub struct FpgaArgs {
    /// Board side length.
    #[arg(long, default_value_t = DEFAULT_FPGA_SIDE)]
    pub size: usize,
    #[command(flatten)]
    pub sim: SimArgs,
    /// Work-group size; size*size must be a multiple of it.
    #[arg(long, default_value_t = DEFAULT_WORK_SIZE)]
    pub work_size: usize,
    /// Offline-compiled kernel image.
    #[arg(long, default_value = DEFAULT_KERNEL_IMAGE)]
    pub kernel_image: PathBuf,
    #[arg(long, default_value = DEFAULT_KERNEL_NAME)]
    pub kernel_name: String,
    /// Compare every device generation with the CPU reference.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, Args)]
pub struct SimArgs {
    #[arg(long, default_value_t = DEFAULT_GENERATIONS)]
    pub generations: u64,
    /// Seed for the random start board; random if omitted.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Share of cells alive in the random start board.
    #[arg(long, default_value_t = DEFAULT_DENSITY)]
    pub density: f64,
    /// Start from a named pattern (block, blinker, glider, toad, beacon) instead.
    #[arg(long)]
    pub pattern: Option<String>,
    /// Print the board every K generations.
    #[arg(long)]
    pub dump_every: Option<u64>,
    /// Timeline CSV written when built with `memtrace`.
    #[arg(long, default_value = "memtrace.csv")]
    pub trace_file: PathBuf,
}

/// Everything a simulation run needs besides the device.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub side: usize,
    pub generations: u64,
    pub seed: Option<u64>,
    pub density: f64,
    pub pattern: Option<String>,
    pub dump_every: Option<u64>,
    pub trace_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub kernel_image: PathBuf,
    pub kernel_name: String,
    pub work_size: usize,
    pub verify: bool,
}

impl RunConfig {
    fn from_sim(side: usize, sim: SimArgs) -> Self {
        Self {
            side,
            generations: sim.generations,
            seed: sim.seed,
            density: sim.density,
            pattern: sim.pattern,
            dump_every: sim.dump_every,
            trace_file: sim.trace_file,
        }
    }

    pub fn validate(&self) -> Result<()> {
        board::cell_count(self.side)?;
        if !(0.0..=1.0).contains(&self.density) {
            return Err(LifeError::InvalidDensity(self.density));
        }
        if let Some(name) = &self.pattern {
            pattern::find(name).ok_or_else(|| LifeError::UnknownPattern(name.clone()))?;
        }
        Ok(())
    }

    /// Pattern centred on the board, or a random fill.
    pub fn initial_board(&self) -> Result<Board> {
        if let Some(name) = &self.pattern {
            let pattern =
                pattern::find(name).ok_or_else(|| LifeError::UnknownPattern(name.clone()))?;
            let (rows, cols) = pattern.extent();
            let origin = pattern.centered_origin(self.side).ok_or(LifeError::OutOfBounds {
                row: rows - 1,
                col: cols - 1,
                side: self.side,
            })?;
            return Board::from_pattern(self.side, pattern, origin);
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Board::random(self.side, self.density, &mut rng)
    }

    /// `true` when generation `generation` should be printed.
    pub fn dumps(&self, generation: u64) -> bool {
        matches!(self.dump_every, Some(every) if every > 0 && generation % every == 0)
    }
}

/// The kernel runs one work-item per cell in groups of `work_size`, so the
/// cell count must split evenly. Returns the global size.
pub fn check_work_size(side: usize, work_size: usize) -> Result<usize> {
    let global = board::cell_count(side)?;
    if work_size == 0 || global % work_size != 0 {
        return Err(LifeError::WorkSize {
            global,
            local: work_size,
        });
    }
    Ok(global)
}

impl DeviceConfig {
    pub fn validate(&self, side: usize) -> Result<()> {
        check_work_size(side, self.work_size).map(drop)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kernel_image: PathBuf::from(DEFAULT_KERNEL_IMAGE),
            kernel_name: DEFAULT_KERNEL_NAME.to_owned(),
            work_size: DEFAULT_WORK_SIZE,
            verify: false,
        }
    }
}

impl From<CpuArgs> for RunConfig {
    fn from(args: CpuArgs) -> Self {
        RunConfig::from_sim(args.size, args.sim)
    }
}

impl FpgaArgs {
    pub fn into_configs(self) -> (RunConfig, DeviceConfig) {
        let device = DeviceConfig {
            kernel_image: self.kernel_image,
            kernel_name: self.kernel_name,
            work_size: self.work_size,
            verify: self.verify,
        };
        (RunConfig::from_sim(self.size, self.sim), device)
    }
}
