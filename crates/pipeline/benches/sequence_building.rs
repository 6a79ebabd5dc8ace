//! Benchmarks for sequence building
//!
//! Run with: cargo bench --package pipeline
//!
//! Uses a synthetic log roughly the shape of MovieLens 1M (6k users, ~165
//! interactions each) so no dataset files are needed.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::Rating;
use pipeline::{SequenceConfig, batch_examples, group_by_user, prepare_examples};

fn synthetic_log(num_users: u32, per_user: u32) -> Vec<Rating> {
    let mut ratings = Vec::with_capacity((num_users * per_user) as usize);
    for step in 0..per_user {
        for user_id in 1..=num_users {
            ratings.push(Rating {
                user_id,
                movie_id: (user_id * 31 + step * 17) % 3_900 + 1,
                rating: 4.0,
                timestamp: ((step * 7_919 + user_id) % per_user) as i64,
            });
        }
    }
    ratings
}

fn bench_group_by_user(c: &mut Criterion) {
    let ratings = synthetic_log(6_000, 165);

    c.bench_function("group_by_user", |b| {
        b.iter(|| black_box(group_by_user(black_box(&ratings))))
    });
}

fn bench_prepare_examples(c: &mut Criterion) {
    let ratings = synthetic_log(6_000, 165);
    let config = SequenceConfig::default();

    c.bench_function("prepare_examples", |b| {
        b.iter(|| black_box(prepare_examples(black_box(&ratings), &config)))
    });
}

fn bench_batching(c: &mut Criterion) {
    let ratings = synthetic_log(6_000, 165);
    let examples = prepare_examples(&ratings, &SequenceConfig::default());

    c.bench_function("batch_examples", |b| {
        b.iter(|| black_box(batch_examples(black_box(&examples), 2048).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_group_by_user,
    bench_prepare_examples,
    bench_batching
);
criterion_main!(benches);
