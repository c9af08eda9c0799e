// Minimal FPGA host: upload, 1000 generations of `next`, read back.

use life_core::config::DeviceConfig;
use life_core::device::FpgaSession;
use life_core::{Board, LifeError};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<(), LifeError> {
    /* ---------- 1. device & kernel image ---------- */
    let session = FpgaSession::open(&DeviceConfig::default())?;
    println!("device: {}", session.device_name());

    /* ---------- 2. start board, ~25 % alive ---------- */
    const SIDE: usize = 512;
    let mut rng = StdRng::seed_from_u64(0);
    let initial = Board::random(SIDE, 0.25, &mut rng)?;

    /* ---------- 3. ping-pong on the device ---------- */
    let last = session.run(&initial, 1000, |generation, _| {
        if generation % 100 == 0 {
            println!("generation {generation}");
        }
        Ok(())
    })?;

    println!("population after 1000 generations = {}", last.population());
    Ok(())
}
