//! Growing-window example generation.
//!
//! A user sequence `[i_0, i_1, ..., i_{n-1}]` yields one example per split
//! position `p` in `1..n`: the context is the (at most `L`) items right
//! before `p`, left-padded with [`PADDING_ITEM_ID`] to exactly `L` entries,
//! and the label is `i_p`.

use crate::config::SequenceConfig;
use crate::sequences::{UserSequence, group_by_user};
use data_loader::{MovieId, Rating};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Item identifier as seen by the model.
pub type ItemId = MovieId;

/// Sentinel "no item" id used for padding. Row 0 of every item embedding
/// table is reserved for it.
pub const PADDING_ITEM_ID: ItemId = 0;

/// A fixed-length context window and the item that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub context_item_ids: Vec<ItemId>,
    pub label_item_id: ItemId,
}

impl TrainingExample {
    /// Number of padding entries at the front of the context.
    pub fn padding_len(&self) -> usize {
        self.context_item_ids
            .iter()
            .take_while(|&&id| id == PADDING_ITEM_ID)
            .count()
    }

    /// The context with the padding prefix stripped.
    pub fn history(&self) -> &[ItemId] {
        &self.context_item_ids[self.padding_len()..]
    }
}

/// Left-pad (or keep the tail of) `items` to exactly `length` entries.
pub fn pad_context(items: &[ItemId], length: usize) -> Vec<ItemId> {
    let tail = &items[items.len().saturating_sub(length)..];

    let mut context = Vec::with_capacity(length);
    context.resize(length - tail.len(), PADDING_ITEM_ID);
    context.extend_from_slice(tail);
    context
}

/// All examples for one user, in chronological order of their labels.
///
/// Users shorter than the configured minimum yield nothing.
pub fn examples_from_sequence(
    sequence: &UserSequence,
    config: &SequenceConfig,
) -> Vec<TrainingExample> {
    if sequence.len() < config.min_sequence_length() {
        return Vec::new();
    }

    let window = config.max_context_length();
    let item_ids: Vec<ItemId> = sequence.item_ids().collect();

    (1..item_ids.len())
        .map(|label_idx| {
            let start = label_idx.saturating_sub(window);
            TrainingExample {
                context_item_ids: pad_context(&item_ids[start..label_idx], window),
                label_item_id: item_ids[label_idx],
            }
        })
        .collect()
}

/// Examples for every user, processed in parallel.
///
/// Output order follows the input order of `sequences`.
pub fn generate_examples(
    sequences: &[UserSequence],
    config: &SequenceConfig,
) -> Vec<TrainingExample> {
    sequences
        .par_iter()
        .flat_map_iter(|sequence| examples_from_sequence(sequence, config))
        .collect()
}

/// Group `ratings` by user and window every eligible sequence.
#[instrument(skip_all, fields(ratings = ratings.len()))]
pub fn prepare_examples(ratings: &[Rating], config: &SequenceConfig) -> Vec<TrainingExample> {
    let sequences = group_by_user(ratings);
    let eligible = sequences
        .iter()
        .filter(|sequence| sequence.len() >= config.min_sequence_length())
        .count();

    let examples = generate_examples(&sequences, config);

    info!(
        users = sequences.len(),
        eligible_users = eligible,
        examples = examples.len(),
        "Generated training examples"
    );

    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(items: &[ItemId]) -> UserSequence {
        UserSequence {
            user_id: 1,
            interactions: items
                .iter()
                .enumerate()
                .map(|(t, &movie_id)| Rating {
                    user_id: 1,
                    movie_id,
                    rating: 5.0,
                    timestamp: 100 + t as i64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_growing_window_scenario() {
        let (a, b, c, d) = (11, 12, 13, 14);
        let config = SequenceConfig::new(3, 3).unwrap();

        let examples = examples_from_sequence(&sequence(&[a, b, c, d]), &config);

        assert_eq!(
            examples,
            vec![
                TrainingExample {
                    context_item_ids: vec![0, 0, a],
                    label_item_id: b
                },
                TrainingExample {
                    context_item_ids: vec![0, a, b],
                    label_item_id: c
                },
                TrainingExample {
                    context_item_ids: vec![a, b, c],
                    label_item_id: d
                },
            ]
        );
    }

    #[test]
    fn test_window_truncates_oldest_items() {
        let config = SequenceConfig::new(2, 2).unwrap();

        let examples = examples_from_sequence(&sequence(&[1, 2, 3, 4, 5]), &config);

        assert_eq!(examples.len(), 4);
        assert_eq!(examples[3].context_item_ids, vec![3, 4]);
        assert_eq!(examples[3].label_item_id, 5);
    }

    #[test]
    fn test_short_users_are_skipped() {
        let config = SequenceConfig::new(10, 3).unwrap();

        assert!(examples_from_sequence(&sequence(&[1, 2]), &config).is_empty());
        assert_eq!(
            examples_from_sequence(&sequence(&[1, 2, 3]), &config).len(),
            2
        );
    }

    #[test]
    fn test_padding_is_prefix_only() {
        let config = SequenceConfig::new(6, 2).unwrap();

        for example in examples_from_sequence(&sequence(&[5, 6, 7, 8]), &config) {
            assert_eq!(example.context_item_ids.len(), 6);
            assert!(example.history().iter().all(|&id| id != PADDING_ITEM_ID));
            assert_eq!(
                example.padding_len() + example.history().len(),
                example.context_item_ids.len()
            );
        }
    }

    #[test]
    fn test_pad_context() {
        assert_eq!(pad_context(&[], 2), vec![0, 0]);
        assert_eq!(pad_context(&[1, 2, 3], 2), vec![2, 3]);
    }
}
