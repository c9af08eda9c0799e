// Glider on a small board, printed every generation until it hits the corner.

use life_core::pattern::GLIDER;
use life_core::{Board, DoubleBuffer, LifeError};

fn main() -> Result<(), LifeError> {
    const SIDE: usize = 12;
    const GENERATIONS: u64 = 36;

    let start = Board::from_pattern(SIDE, &GLIDER, (0, 0))?;
    let mut buffer = DoubleBuffer::new(start);

    buffer.run(GENERATIONS, |generation, board| {
        println!("generation {generation}, population {}", board.population());
        println!("{board}");
    });

    println!("final population = {}", buffer.current().population());
    Ok(())
}
