//! Top-level runs behind the `life` subcommands.

use tracing::{debug, info};

use crate::board::Board;
use crate::config::{DeviceConfig, RunConfig};
use crate::generations::DoubleBuffer;
use crate::Result;

fn report(config: &RunConfig, generation: u64, board: &Board) {
    debug!(generation, population = board.population(), "generation");
    if config.dumps(generation) {
        println!("generation {generation}\n{board}");
    }
}

/// CPU reference run; returns the board after `config.generations` steps.
pub fn run_cpu(config: &RunConfig) -> Result<Board> {
    config.validate()?;
    let initial = config.initial_board()?;
    info!(
        side = config.side,
        generations = config.generations,
        population = initial.population(),
        "starting CPU run"
    );

    let mut buffer = DoubleBuffer::new(initial);
    buffer.run(config.generations, |generation, board| report(config, generation, board));

    let last = buffer.into_current();
    info!(population = last.population(), "CPU run finished");
    Ok(last)
}

/// Device run, optionally checked against the CPU reference every generation.
#[cfg(feature = "fpga")]
pub fn run_fpga(config: &RunConfig, device: &DeviceConfig) -> Result<Board> {
    use crate::device::FpgaSession;

    config.validate()?;
    device.validate(config.side)?;
    let initial = config.initial_board()?;

    let session = FpgaSession::open(device)?;
    info!(
        device = session.device_name(),
        side = config.side,
        generations = config.generations,
        verify = device.verify,
        "starting FPGA run"
    );

    let last = if device.verify {
        session.run_verified(&initial, config.generations, |generation, board| {
            report(config, generation, board)
        })?
    } else {
        let mut host = initial.empty_like();
        session.run(&initial, config.generations, |generation, current| {
            if config.dumps(generation) {
                session.download(current, &mut host)?;
                report(config, generation, &host);
            }
            Ok(())
        })?
    };

    info!(population = last.population(), "FPGA run finished");
    Ok(last)
}

#[cfg(not(feature = "fpga"))]
pub fn run_fpga(_config: &RunConfig, _device: &DeviceConfig) -> Result<Board> {
    Err(crate::LifeError::Unsupported(
        "built without the `fpga` feature; rebuild with `--features fpga`",
    ))
}

/// Writes the transfer timeline when built with `memtrace`.
pub fn finish_trace(config: &RunConfig) -> Result<()> {
    #[cfg(feature = "memtrace")]
    {
        let rows = crate::memtracer::flush_csv(&config.trace_file)?;
        info!(path = %config.trace_file.display(), rows, "wrote memtrace");
    }
    #[cfg(not(feature = "memtrace"))]
    let _ = config;
    Ok(())
}
