use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use snake_2048::engine::{Board, Move};
use snake_2048::expectimax::{evaluate_with, explain, HeuristicKind};
use snake_2048::weights::HeuristicWeights;
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut boards = vec![Board::default()];
    let mut b = Board::default();
    b.add_random_tile(&mut rng);
    b.add_random_tile(&mut rng);
    boards.push(b.clone());
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..24 {
        if b.shift(seq[i % seq.len()]) {
            b.add_random_tile(&mut rng);
        }
        boards.push(b.clone());
    }
    boards
}

fn bench_heuristic(c: &mut Criterion) {
    let boards = corpus();
    let w = HeuristicWeights::default();
    for kind in [HeuristicKind::Configurable, HeuristicKind::CornerSnake, HeuristicKind::Aggressive] {
        c.bench_function(&format!("heuristic/{kind:?}"), |bch| {
            bch.iter(|| {
                let mut acc = 0f64;
                for bd in &boards {
                    let v = evaluate_with(kind, bd, &w);
                    if v.is_finite() {
                        acc = acc.mul_add(1.000_000_1, v);
                    }
                }
                black_box(acc)
            })
        });
    }
    c.bench_function("heuristic/explain", |bch| {
        bch.iter(|| {
            let mut n = 0usize;
            for bd in &boards {
                n += explain(bd, &w).components.len();
            }
            black_box(n)
        })
    });
}

criterion_group!(heuristic, bench_heuristic);
criterion_main!(heuristic);
