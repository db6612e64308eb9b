use criterion::{criterion_group, criterion_main, Criterion};

use sokoban_bidir::config::{SolverConfig, Strategy};
use sokoban_bidir::{LoadLevel, Solve};

// allowing unused so i can bench just one or few
// and still notice other warnings if there are any
#[allow(unused)]
fn bench_two_boxes(c: &mut Criterion) {
    bench_level(c, "levels/custom/03-two-boxes.txt", 100);
}

#[allow(unused)]
fn bench_goal_room(c: &mut Criterion) {
    // 3 boxes into a room behind an entrance
    bench_level(c, "levels/custom/04-goal-room.txt", 50);
}

#[allow(unused)]
fn bench_corridors(c: &mut Criterion) {
    bench_level(c, "levels/custom/05-corridors.txt", 50);
}

fn bench_level(c: &mut Criterion, level_path: &str, samples: usize) {
    let level = level_path.load_level().unwrap();

    let mut group = c.benchmark_group(level_path);
    group.sample_size(samples);
    for &strategy in &[
        Strategy::Forward,
        Strategy::Bidirectional,
        Strategy::ParallelBidirectional,
    ] {
        let config = SolverConfig::with_strategy(strategy);
        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| {
                criterion::black_box(
                    level.solve(criterion::black_box(&config), criterion::black_box(false)),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_two_boxes,
    bench_goal_room,
    //bench_corridors,
);
criterion_main!(benches);
