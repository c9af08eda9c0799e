use crate::board::Board;
use crate::rule;

/// Two boards that take turns as source and destination.
///
/// `boards[generation % 2]` is the current board; each [`advance`](Self::advance)
/// writes the other one and flips the parity. Both boards live exactly as long
/// as the buffer.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    boards: [Board; 2],
    generation: u64,
}

impl DoubleBuffer {
    pub fn new(initial: Board) -> Self {
        let scratch = initial.empty_like();
        Self {
            boards: [initial, scratch],
            generation: 0,
        }
    }

    #[inline]
    fn parity(&self) -> usize {
        (self.generation % 2) as usize
    }

    pub fn current(&self) -> &Board {
        &self.boards[self.parity()]
    }

    /// Generations computed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn advance(&mut self) {
        let [even, odd] = &mut self.boards;
        if self.generation % 2 == 0 {
            rule::step_unchecked(even, odd);
        } else {
            rule::step_unchecked(odd, even);
        }
        self.generation += 1;
    }

    /// Advances `generations` times. `observer` sees each board before it is
    /// stepped, tagged with its generation number.
    pub fn run<F>(&mut self, generations: u64, mut observer: F)
    where
        F: FnMut(u64, &Board),
    {
        for _ in 0..generations {
            observer(self.generation, self.current());
            self.advance();
        }
    }

    pub fn into_current(self) -> Board {
        let parity = self.parity();
        let [even, odd] = self.boards;
        if parity == 0 { even } else { odd }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern;

    #[test]
    fn parity_selects_current_board() {
        let start = Board::from_pattern(5, &pattern::BLINKER, (2, 1)).unwrap();
        let mut buffer = DoubleBuffer::new(start.clone());
        assert_eq!(buffer.current(), &start);

        buffer.advance();
        assert_eq!(buffer.generation(), 1);
        assert_ne!(buffer.current(), &start);

        buffer.advance();
        assert_eq!(buffer.generation(), 2);
        assert_eq!(buffer.current(), &start);
    }

    #[test]
    fn run_observes_before_each_step() {
        let start = Board::from_pattern(6, &pattern::GLIDER, (0, 0)).unwrap();
        let mut buffer = DoubleBuffer::new(start);
        let mut seen = Vec::new();
        buffer.run(4, |generation, board| seen.push((generation, board.population())));

        assert_eq!(seen.iter().map(|&(g, _)| g).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        // a free glider always has five cells
        assert!(seen.iter().all(|&(_, population)| population == 5));
        assert_eq!(buffer.generation(), 4);
    }

    #[test]
    fn into_current_returns_latest() {
        let start = Board::from_pattern(5, &pattern::BLINKER, (2, 1)).unwrap();
        let mut buffer = DoubleBuffer::new(start);
        buffer.advance();
        let latest = buffer.current().clone();
        assert_eq!(buffer.into_current(), latest);
    }
}
