use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use rayon::ThreadPoolBuilder;
use snake_2048::driver::{play, Game};
use snake_2048::engine::{Board, Move};
use snake_2048::expectimax::{Expectimax, ExpectimaxConfig, ExpectimaxParallel};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(7777);
    let mut boards = Vec::new();
    let mut b = Board::default();
    b.add_random_tile(&mut rng);
    b.add_random_tile(&mut rng);
    boards.push(b.clone());
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..16 {
        if b.shift(seq[i % seq.len()]) {
            b.add_random_tile(&mut rng);
        }
        boards.push(b.clone());
    }
    boards
}

fn bench_seq(c: &mut Criterion) {
    let boards = corpus();
    let mut ex = Expectimax::with_config(ExpectimaxConfig { depth: 2, ..Default::default() });

    c.bench_function("expectimax/branch_evals", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for bd in &boards {
                for be in ex.branch_evals(bd) {
                    if be.legal && be.ev.is_finite() {
                        acc += be.ev;
                    }
                }
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax/best_move", |bch| {
        bch.iter(|| {
            let mut acc = 0usize;
            for bd in &boards {
                acc ^= ex.best_move(bd).map_or(0, Move::index);
            }
            black_box(acc)
        })
    });
}

fn bench_par(c: &mut Criterion) {
    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let boards = corpus();
    let mut ex = ExpectimaxParallel::with_config(ExpectimaxConfig { depth: 2, ..Default::default() });

    c.bench_function("expectimax_par/best_move", |bch| {
        bch.iter(|| {
            pool.install(|| {
                let mut acc = 0usize;
                for bd in &boards {
                    acc ^= ex.best_move(bd).map_or(0, Move::index);
                }
                black_box(acc)
            })
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let mut ex = ExpectimaxParallel::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
    c.bench_function("e2e_par/32_moves", |bch| {
        bch.iter(|| {
            pool.install(|| {
                let mut rng = StdRng::seed_from_u64(13);
                let mut game = Game::new(4, &mut rng);
                black_box(play(&mut game, &mut ex, &mut rng, Some(32), |_| {}))
            })
        })
    });
}

criterion_group!(expectimax, bench_seq, bench_par, bench_e2e);
criterion_main!(expectimax);
