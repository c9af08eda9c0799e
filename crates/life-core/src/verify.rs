use crate::board::{Board, Cell};
use crate::generations::DoubleBuffer;
use crate::{LifeError, Result};

/// First cell where two boards disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub expected: Cell,
    pub actual: Cell,
}

/// `Ok(None)` when both boards are identical.
pub fn first_mismatch(expected: &Board, actual: &Board) -> Result<Option<Mismatch>> {
    if expected.side() != actual.side() {
        return Err(LifeError::SizeMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    let side = expected.side();
    Ok(expected
        .cells()
        .iter()
        .zip(actual.cells())
        .position(|(e, a)| e != a)
        .map(|index| Mismatch {
            row: index / side,
            col: index % side,
            expected: expected.cells()[index],
            actual: actual.cells()[index],
        }))
}

/// Like [`first_mismatch`], but a difference becomes [`LifeError::Diverged`].
pub fn check_generation(generation: u64, expected: &Board, actual: &Board) -> Result<()> {
    match first_mismatch(expected, actual)? {
        Some(Mismatch { row, col, .. }) => Err(LifeError::Diverged {
            generation,
            row,
            col,
        }),
        None => Ok(()),
    }
}

/// CPU reference that follows another implementation one generation at a time.
#[derive(Debug, Clone)]
pub struct Lockstep {
    reference: DoubleBuffer,
}

impl Lockstep {
    pub fn new(initial: &Board) -> Self {
        Self {
            reference: DoubleBuffer::new(initial.clone()),
        }
    }

    /// Generation the next checked board must be at.
    pub fn generation(&self) -> u64 {
        self.reference.generation()
    }

    /// Compares `actual` with the reference without advancing.
    pub fn check(&self, actual: &Board) -> Result<()> {
        check_generation(self.generation(), self.reference.current(), actual)
    }

    /// Compares, then steps the reference to the next generation.
    pub fn check_and_advance(&mut self, actual: &Board) -> Result<()> {
        self.check(actual)?;
        self.reference.advance();
        Ok(())
    }
}
