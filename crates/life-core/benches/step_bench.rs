// CPU reference step, one sweep per iteration.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use life_core::{step, Board, DoubleBuffer};
use rand::{rngs::StdRng, SeedableRng};

use std::time::Duration;

const SIDES: [usize; 3] = [64, 256, 512];
const N_GENERATIONS: u64 = 10;

fn bench_step(c: &mut Criterion) {
    let mut g = c.benchmark_group("cpu_step");

    for side in SIDES {
        let mut rng = StdRng::seed_from_u64(side as u64);
        let board = Board::random(side, 0.25, &mut rng).unwrap();
        let mut out = board.empty_like();

        g.throughput(Throughput::Elements((side * side) as u64));
        g.bench_function(format!("step_{side}x{side}"), |b| {
            b.iter(|| step(&board, &mut out).unwrap());
        });
    }

    g.finish();
}

fn bench_double_buffer(c: &mut Criterion) {
    let mut g = c.benchmark_group("double_buffer");
    let side = 256;
    g.throughput(Throughput::Elements((side * side) as u64 * N_GENERATIONS));

    g.bench_function("256x256_10gen", |b| {
        b.iter_batched(
            || {
                let mut rng = StdRng::seed_from_u64(1);
                DoubleBuffer::new(Board::random(side, 0.25, &mut rng).unwrap())
            },
            |mut buffer| {
                buffer.run(N_GENERATIONS, |_, _| {});
                buffer
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .sample_size(30)
        .configure_from_args()
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_step, bench_double_buffer
}
criterion_main!(benches);
