//! Grouping the interaction log into per-user, time-ordered sequences.

use data_loader::{Rating, UserId};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One user's interactions, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSequence {
    pub user_id: UserId,
    pub interactions: Vec<Rating>,
}

impl UserSequence {
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Item ids in chronological order.
    pub fn item_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.interactions.iter().map(|rating| rating.movie_id)
    }
}

/// Group interactions by user, ordering each group by timestamp.
///
/// Groups come back ordered by user id. Within a group the sort is stable,
/// so interactions sharing a timestamp keep their order from the input.
pub fn group_by_user(ratings: &[Rating]) -> Vec<UserSequence> {
    let mut grouped: BTreeMap<UserId, Vec<Rating>> = BTreeMap::new();
    for rating in ratings {
        grouped.entry(rating.user_id).or_default().push(*rating);
    }

    let mut sequences: Vec<UserSequence> = grouped
        .into_iter()
        .map(|(user_id, interactions)| UserSequence {
            user_id,
            interactions,
        })
        .collect();

    sequences
        .par_iter_mut()
        .for_each(|sequence| sequence.interactions.sort_by_key(|rating| rating.timestamp));

    sequences
}
