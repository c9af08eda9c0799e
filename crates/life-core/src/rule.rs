//! B3/S23 transition on a clipped (non-wrapping) grid.
//!
//! This is the host-side reference for the `next` device kernel: both must
//! produce identical boards generation for generation.

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::board::{Board, ALIVE, DEAD};
use crate::{LifeError, Result};

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Live cells among the up to 8 neighbours of `(row, col)`. Off-grid
/// positions are skipped, so corners look at 3 cells and edges at 5.
pub fn live_neighbors(board: &Board, row: usize, col: usize) -> u8 {
    NEIGHBOR_OFFSETS
        .iter()
        .filter(|&&(dr, dc)| {
            match (row.checked_add_signed(dr), col.checked_add_signed(dc)) {
                (Some(r), Some(c)) => board.is_alive(r, c),
                _ => false,
            }
        })
        .count() as u8
}

/// Born with exactly 3 neighbours, survives with 2 or 3.
#[inline]
pub fn next_state(alive: bool, neighbors: u8) -> bool {
    neighbors == 3 || (neighbors == 2 && alive)
}

/// Writes the generation after `input` into `output`.
///
/// Every cell of `output` is overwritten, so its previous contents do not
/// matter. Boards of different sides are the only failure.
pub fn step(input: &Board, output: &mut Board) -> Result<()> {
    if input.side() != output.side() {
        return Err(LifeError::SizeMismatch {
            expected: input.len(),
            actual: output.len(),
        });
    }
    step_unchecked(input, output);
    Ok(())
}

/// Same as [`step`] into a freshly allocated board.
pub fn step_into_new(input: &Board) -> Board {
    let mut output = input.empty_like();
    step_unchecked(input, &mut output);
    output
}

pub(crate) fn step_unchecked(input: &Board, output: &mut Board) {
    debug_assert_eq!(input.side(), output.side());

    #[cfg(feature = "metrics")]
    let t = Instant::now();

    let side = input.side();
    let out = output.cells_mut();
    for row in 0..side {
        for col in 0..side {
            let alive = input.is_alive(row, col);
            let neighbors = live_neighbors(input, row, col);
            out[row * side + col] = if next_state(alive, neighbors) { ALIVE } else { DEAD };
        }
    }

    #[cfg(feature = "metrics")]
    crate::metrics::record("cpu_step", t);
}
