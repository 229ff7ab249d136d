use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use minefray_core::{Board, CELL_COUNT, solver};

fn opening_board() -> Board {
    let mut board = Board::random(0xB0A2D);
    let first_safe = (0..CELL_COUNT as u8)
        .find(|&cell| !board.has_mine(cell))
        .expect("a board always has safe cells");
    board.reveal(first_safe);
    board
}

fn midgame_board() -> Board {
    let mut board = Board::random(0xB0A2D);
    let mut revealed = 0;
    for cell in 0..CELL_COUNT as u8 {
        if !board.has_mine(cell) {
            board.reveal(cell);
            revealed += 1;
            if revealed == 12 {
                break;
            }
        }
    }
    board
}

fn bench_probabilities(c: &mut Criterion) {
    let opening = opening_board().states();
    c.bench_function("probabilities/opening", |b| {
        b.iter(|| solver::mine_probabilities(black_box(&opening)))
    });

    let midgame = midgame_board().states();
    c.bench_function("probabilities/midgame", |b| {
        b.iter(|| solver::mine_probabilities(black_box(&midgame)))
    });
}

criterion_group!(benches, bench_probabilities);
criterion_main!(benches);
