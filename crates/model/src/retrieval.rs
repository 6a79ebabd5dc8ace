//! Exhaustive top-k retrieval over an embedding table.

use crate::error::{ModelError, Result};
use candle_core::Tensor;
use pipeline::ItemId;
use rayon::prelude::*;

/// Top-k rows per query, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    pub item_ids: Vec<Vec<ItemId>>,
    /// Present only when the operator was built with `return_scores`.
    pub scores: Option<Vec<Vec<f32>>>,
}

/// Scores every query against every row of a candidate table.
///
/// The table handle is read on each call, so in-place updates to the
/// underlying variable (e.g. by an optimizer) show up in the next result.
/// Row index is the returned item id.
#[derive(Debug, Clone)]
pub struct BruteForceRetrieval {
    candidates: Tensor,
    k: usize,
    return_scores: bool,
}

impl BruteForceRetrieval {
    pub fn new(candidates: Tensor, k: usize, return_scores: bool) -> Result<Self> {
        if k == 0 {
            return Err(ModelError::InvalidConfig {
                field: "k".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        candidates.dims2()?;

        Ok(Self {
            candidates,
            k,
            return_scores,
        })
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates.dims()[0]
    }

    /// Top-`min(k, rows)` candidates for each `(b, d)` query row.
    ///
    /// Ties are broken towards the lower row index. NaN scores rank below
    /// every other score.
    pub fn retrieve(&self, queries: &Tensor) -> Result<Retrieved> {
        let scores = queries.matmul(&self.candidates.t()?)?.to_vec2::<f32>()?;
        let k = self.k.min(self.num_candidates());

        let ranked: Vec<(Vec<ItemId>, Vec<f32>)> =
            scores.par_iter().map(|row| top_k(row, k)).collect();
        let (item_ids, scores): (Vec<_>, Vec<_>) = ranked.into_iter().unzip();

        Ok(Retrieved {
            item_ids,
            scores: self.return_scores.then_some(scores),
        })
    }
}

fn top_k(row: &[f32], k: usize) -> (Vec<ItemId>, Vec<f32>) {
    let mut indices: Vec<usize> = (0..row.len()).collect();
    let by_score = |&a: &usize, &b: &usize| {
        match (row[a].is_nan(), row[b].is_nan()) {
            (false, false) => row[b].total_cmp(&row[a]),
            (a_is_nan, b_is_nan) => a_is_nan.cmp(&b_is_nan),
        }
        .then(a.cmp(&b))
    };

    if k < indices.len() {
        indices.select_nth_unstable_by(k, by_score);
        indices.truncate(k);
    }
    indices.sort_unstable_by(by_score);

    let scores = indices.iter().map(|&i| row[i]).collect();
    let ids = indices.into_iter().map(|i| i as ItemId).collect();
    (ids, scores)
}
