//! Integration tests for the data preparation pipeline.
//!
//! These run the filter, sequence and batching stages together over a small
//! synthetic interaction log.

use data_loader::Rating;
use pipeline::filters::MinimumRatingFilter;
use pipeline::{
    FilterPipeline, PADDING_ITEM_ID, SequenceConfig, TrainingExample, batch_examples,
    group_by_user, prepare_examples, train_test_split,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Users 1..=6 with `user_id + 1` interactions each, timestamps shuffled in
/// the log, plus a few low ratings.
fn create_interactions() -> Vec<Rating> {
    let mut ratings = Vec::new();

    for user_id in 1..=6u32 {
        for step in (0..=user_id).rev() {
            ratings.push(Rating {
                user_id,
                movie_id: user_id * 100 + step,
                rating: 4.0,
                timestamp: 1_000 + step as i64,
            });
        }
    }

    // Low ratings that the filter should remove
    for user_id in 1..=3u32 {
        ratings.push(Rating {
            user_id,
            movie_id: 999,
            rating: 1.0,
            timestamp: 5,
        });
    }

    ratings
}

fn prepared(config: &SequenceConfig) -> (Vec<Rating>, Vec<TrainingExample>) {
    let ratings = FilterPipeline::new()
        .add_filter(MinimumRatingFilter::new(2.0))
        .apply(create_interactions())
        .unwrap();
    let examples = prepare_examples(&ratings, config);
    (ratings, examples)
}

#[test]
fn test_example_count_per_user() {
    let config = SequenceConfig::new(4, 3).unwrap();
    let (ratings, examples) = prepared(&config);

    assert!(ratings.iter().all(|r| r.movie_id != 999));

    let sequences = group_by_user(&ratings);
    let expected: usize = sequences
        .iter()
        .filter(|s| s.len() >= config.min_sequence_length())
        .map(|s| s.len() - 1)
        .sum();

    // User 1 has only 2 interactions and is dropped
    assert_eq!(expected, 2 + 3 + 4 + 5 + 6);
    assert_eq!(examples.len(), expected);
}

#[test]
fn test_labels_follow_context() {
    let config = SequenceConfig::new(4, 3).unwrap();
    let (ratings, examples) = prepared(&config);

    let chronological: HashMap<u32, Vec<u32>> = group_by_user(&ratings)
        .into_iter()
        .map(|s| (s.user_id, s.item_ids().collect()))
        .collect();

    for example in &examples {
        assert_eq!(example.context_item_ids.len(), 4);

        // Item ids encode the user in their hundreds digit
        let user_id = example.label_item_id / 100;
        let items = &chronological[&user_id];
        let position = items
            .iter()
            .position(|&id| id == example.label_item_id)
            .unwrap();

        let history = example.history();
        assert_eq!(history, &items[position.saturating_sub(4)..position]);
        assert!(
            example.context_item_ids[..example.padding_len()]
                .iter()
                .all(|&id| id == PADDING_ITEM_ID)
        );
    }
}

#[test]
fn test_split_and_batch() {
    let config = SequenceConfig::default();
    let (_, examples) = prepared(&config);
    let total = examples.len();

    let mut rng = StdRng::seed_from_u64(42);
    let (train, test) = train_test_split(examples, 0.9, &mut rng);
    assert_eq!(train.len() + test.len(), total);

    let batches = batch_examples(&train, 4).unwrap();
    assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), train.len());
    for batch in &batches {
        assert_eq!(batch.context_length(), config.max_context_length());
        assert_eq!(
            batch.context_item_ids().len(),
            batch.len() * batch.context_length()
        );
    }
}
