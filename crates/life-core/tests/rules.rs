use life_core::pattern::{BLINKER, BLOCK};
use life_core::{live_neighbors, step, Board, DoubleBuffer};
use rand::{rngs::StdRng, SeedableRng};

fn random_boards() -> impl Iterator<Item = Board> {
    let mut rng = StdRng::seed_from_u64(0x11fe);
    (0..40).map(move |i| {
        let side = 1 + i % 13;
        let density = [0.1, 0.25, 0.5, 0.8][i % 4];
        Board::random(side, density, &mut rng).unwrap()
    })
}

fn next(board: &Board) -> Board {
    let mut out = board.empty_like();
    step(board, &mut out).unwrap();
    out
}

#[test]
fn three_neighbours_means_alive() {
    for board in random_boards() {
        let out = next(&board);
        for row in 0..board.side() {
            for col in 0..board.side() {
                if live_neighbors(&board, row, col) == 3 {
                    assert!(out.is_alive(row, col), "({row}, {col}) on\n{board}");
                }
            }
        }
    }
}

#[test]
fn two_neighbours_keeps_state() {
    for board in random_boards() {
        let out = next(&board);
        for row in 0..board.side() {
            for col in 0..board.side() {
                if live_neighbors(&board, row, col) == 2 {
                    assert_eq!(out.is_alive(row, col), board.is_alive(row, col));
                }
            }
        }
    }
}

#[test]
fn under_and_overpopulation_kill() {
    for board in random_boards() {
        let out = next(&board);
        for row in 0..board.side() {
            for col in 0..board.side() {
                let n = live_neighbors(&board, row, col);
                if !(2..=3).contains(&n) {
                    assert!(!out.is_alive(row, col));
                }
            }
        }
    }
}

#[test]
fn dead_board_stays_dead() {
    for side in [1, 2, 3, 8, 31] {
        let board = Board::new(side).unwrap();
        assert_eq!(next(&board), board);
    }
}

#[test]
fn corner_cell_is_not_seen_through_the_edge() {
    let mut board = Board::new(3).unwrap();
    board.set(0, 0, true).unwrap();
    assert_eq!(live_neighbors(&board, 1, 1), 1);
    // the opposite corner would see it on a torus
    assert_eq!(live_neighbors(&board, 2, 2), 0);
    assert_eq!(next(&board).population(), 0);
}

#[test]
fn block_is_still() {
    for side in [4, 5, 9] {
        let board = Board::from_pattern(side, &BLOCK, (1, 1)).unwrap();
        assert_eq!(next(&board), board);
    }
    // flush against the corner it is still a block
    let corner = Board::from_pattern(4, &BLOCK, (0, 0)).unwrap();
    assert_eq!(next(&corner), corner);
}

#[test]
fn blinker_rotates_then_returns() {
    let horizontal = Board::from_pattern(5, &BLINKER, (2, 1)).unwrap();
    let mut vertical = Board::new(5).unwrap();
    for row in 1..=3 {
        vertical.set(row, 2, true).unwrap();
    }

    let once = next(&horizontal);
    assert_eq!(once, vertical);
    assert_eq!(next(&once), horizontal);

    let mut buffer = DoubleBuffer::new(horizontal.clone());
    buffer.advance();
    buffer.advance();
    assert_eq!(buffer.current(), &horizontal);
}

#[test]
fn step_is_pure() {
    for board in random_boards() {
        let before = board.clone();
        let a = next(&board);
        let b = next(&board);
        assert_eq!(board, before);
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
    }
}
