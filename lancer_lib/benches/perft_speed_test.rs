use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};

use lancer_lib::board::Board;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);

    group.bench_function("perft 4 startpos", |b| {
        let mut board = Board::new();
        b.iter(|| board.perft(4))
    });

    group.bench_function("perft 3 kiwipete", |b| {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        b.iter(|| board.perft(3))
    });

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
);
criterion_main!(benches);
