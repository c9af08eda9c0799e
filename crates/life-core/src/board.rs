use std::fmt;

use rand::Rng;

use crate::pattern::Pattern;
use crate::{LifeError, Result};

/// One cell as the device kernel sees it (`cl_int`).
pub type Cell = i32;

pub const DEAD: Cell = 0;
pub const ALIVE: Cell = 1;

/// Number of cells on a `side x side` board.
///
/// Rejects a zero side and any side whose cell buffer would not fit in
/// memory (`side²` cells of [`Cell`] must stay within `isize::MAX` bytes).
pub fn cell_count(side: usize) -> Result<usize> {
    side.checked_mul(side)
        .filter(|&n| n > 0)
        .filter(|&n| {
            n.checked_mul(std::mem::size_of::<Cell>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(LifeError::InvalidSize(side))
}

/// Square grid of side `N`, stored row-major: `index = row * N + col`.
///
/// Every cell is either [`DEAD`] or [`ALIVE`]; constructors reject anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    side: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// All-dead board.
    pub fn new(side: usize) -> Result<Self> {
        let len = cell_count(side)?;
        Ok(Self {
            side,
            cells: vec![DEAD; len],
        })
    }

    pub fn from_cells(side: usize, cells: Vec<Cell>) -> Result<Self> {
        let len = cell_count(side)?;
        if cells.len() != len {
            return Err(LifeError::SizeMismatch {
                expected: len,
                actual: cells.len(),
            });
        }
        let board = Self { side, cells };
        board.validate()?;
        Ok(board)
    }

    /// Each cell is alive with probability `density`.
    pub fn random<R>(side: usize, density: f64, rng: &mut R) -> Result<Self>
    where
        R: Rng,
    {
        if !(0.0..=1.0).contains(&density) {
            return Err(LifeError::InvalidDensity(density));
        }
        let mut board = Self::new(side)?;
        for cell in &mut board.cells {
            *cell = if rng.random_bool(density) { ALIVE } else { DEAD };
        }
        Ok(board)
    }

    /// All-dead board with `pattern` placed at `origin` (row, col).
    pub fn from_pattern(side: usize, pattern: &Pattern, origin: (usize, usize)) -> Result<Self> {
        let mut board = Self::new(side)?;
        board.place(pattern, origin)?;
        Ok(board)
    }

    /// All-dead board of the same side.
    pub fn empty_like(&self) -> Self {
        Self {
            side: self.side,
            cells: vec![DEAD; self.cells.len()],
        }
    }

    pub fn place(&mut self, pattern: &Pattern, (row, col): (usize, usize)) -> Result<()> {
        // check the whole footprint before touching any cell
        for &(dr, dc) in pattern.cells {
            self.index(row + dr, col + dc)?;
        }
        for &(dr, dc) in pattern.cells {
            self.set(row + dr, col + dc, true)?;
        }
        Ok(())
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of cells, `side * side`.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.side || col >= self.side {
            return Err(LifeError::OutOfBounds {
                row,
                col,
                side: self.side,
            });
        }
        Ok(row * self.side + col)
    }

    /// Off-board positions read as dead.
    #[inline]
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        row < self.side && col < self.side && self.cells[row * self.side + col] == ALIVE
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) -> Result<()> {
        let index = self.index(row, col)?;
        self.cells[index] = if alive { ALIVE } else { DEAD };
        Ok(())
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == ALIVE).count()
    }

    pub fn clear(&mut self) {
        self.cells.fill(DEAD);
    }

    /// Byte view for host → device copies.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Byte view for device → host copies. Call [`Board::validate`] afterwards.
    #[cfg_attr(not(feature = "fpga"), allow(dead_code))]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.cells)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Fails on the first cell that is neither dead nor alive.
    pub fn validate(&self) -> Result<()> {
        match self
            .cells
            .iter()
            .position(|&cell| cell != DEAD && cell != ALIVE)
        {
            Some(index) => Err(LifeError::InvalidCell {
                index,
                value: self.cells[index],
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.side) {
            for &cell in row {
                f.write_str(if cell == ALIVE { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn zero_side_is_rejected() {
        assert!(matches!(Board::new(0), Err(LifeError::InvalidSize(0))));
        assert!(matches!(
            Board::from_cells(0, vec![]),
            Err(LifeError::InvalidSize(0))
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn side_whose_square_overflows_is_rejected() {
        let huge = 1usize << 32;
        assert!(matches!(Board::new(huge), Err(LifeError::InvalidSize(s)) if s == huge));
        assert!(matches!(
            Board::from_cells(huge, vec![]),
            Err(LifeError::InvalidSize(_))
        ));
        // squares fine, but the byte length does not
        assert!(cell_count(1 << 31).is_err());
        assert_eq!(cell_count(1 << 20).unwrap(), 1 << 40);
        assert_eq!(cell_count(3).unwrap(), 9);
    }

    #[test]
    fn from_cells_checks_length_and_values() {
        assert!(matches!(
            Board::from_cells(2, vec![0, 1, 0]),
            Err(LifeError::SizeMismatch { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            Board::from_cells(2, vec![0, 1, 2, 0]),
            Err(LifeError::InvalidCell { index: 2, value: 2 })
        ));
        let board = Board::from_cells(2, vec![0, 1, 1, 0]).unwrap();
        assert_eq!(board.population(), 2);
        assert!(board.is_alive(0, 1));
        assert!(board.is_alive(1, 0));
    }

    #[test]
    fn row_major_indexing() {
        let mut board = Board::new(4).unwrap();
        board.set(1, 3, true).unwrap();
        assert_eq!(board.index(1, 3).unwrap(), 7);
        assert_eq!(board.cells()[7], ALIVE);
        assert!(matches!(
            board.set(4, 0, true),
            Err(LifeError::OutOfBounds { row: 4, col: 0, side: 4 })
        ));
        // col past the edge must not wrap into the next row
        assert!(!board.is_alive(0, 7));
    }

    #[test]
    fn random_respects_density_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(Board::random(8, 0.0, &mut rng).unwrap().population() == 0);
        assert_eq!(Board::random(8, 1.0, &mut rng).unwrap().population(), 64);
        assert!(matches!(
            Board::random(8, 1.5, &mut rng),
            Err(LifeError::InvalidDensity(_))
        ));
        assert!(matches!(
            Board::random(8, f64::NAN, &mut rng),
            Err(LifeError::InvalidDensity(_))
        ));
    }

    #[test]
    fn random_quarter_density_is_roughly_a_quarter() {
        let mut rng = StdRng::seed_from_u64(42);
        let board = Board::random(128, 0.25, &mut rng).unwrap();
        let share = board.population() as f64 / board.len() as f64;
        assert!((0.2..0.3).contains(&share), "share = {share}");
    }

    #[test]
    fn pattern_placement_is_all_or_nothing() {
        let mut board = Board::new(4).unwrap();
        assert!(board.place(&pattern::GLIDER, (2, 2)).is_err());
        assert_eq!(board.population(), 0);

        board.place(&pattern::BLOCK, (2, 2)).unwrap();
        assert_eq!(board.population(), 4);
        assert!(board.is_alive(3, 3));
    }

    #[test]
    fn display_renders_rows() {
        let board = Board::from_pattern(3, &pattern::BLINKER, (1, 0)).unwrap();
        assert_eq!(board.to_string(), "...\n###\n...\n");
    }

    #[test]
    fn byte_view_matches_cell_layout() {
        let board = Board::from_cells(2, vec![1, 0, 0, 1]).unwrap();
        let bytes = board.as_bytes();
        assert_eq!(bytes.len(), 4 * std::mem::size_of::<Cell>());
        assert_eq!(&bytes[..4], &1_i32.to_ne_bytes());
    }

    #[test]
    fn clear_and_empty_like() {
        let mut board = Board::from_pattern(4, &pattern::BLOCK, (0, 0)).unwrap();
        let empty = board.empty_like();
        assert_eq!(empty.side(), 4);
        assert_eq!(empty.population(), 0);
        board.clear();
        assert_eq!(board, empty);
    }
}
