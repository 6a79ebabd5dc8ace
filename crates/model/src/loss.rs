//! In-batch softmax loss.
//!
//! For a batch of `N` (query, positive item) pairs, every other positive in
//! the batch serves as a negative for a given query:
//!
//! ```text
//! scores = queries · candidatesᵀ                 (N × N)
//! labels = I_N                                   (row i's positive is column i)
//! loss   = mean_i( -Σ_j labels[i, j] · log_softmax(scores[i])[j] )
//! ```

use crate::error::{ModelError, Result};
use candle_core::{D, Device, Tensor};
use candle_nn::ops::log_softmax;

/// An `n × m` float matrix with ones on the main diagonal.
pub fn identity_labels(n: usize, m: usize, device: &Device) -> Result<Tensor> {
    let mut values = vec![0f32; n * m];
    for i in 0..n.min(m) {
        values[i * m + i] = 1.0;
    }
    Ok(Tensor::from_vec(values, (n, m), device)?)
}

/// Row-wise categorical cross-entropy of `labels` against unnormalized
/// `logits`, averaged over rows.
pub fn categorical_crossentropy_from_logits(labels: &Tensor, logits: &Tensor) -> Result<Tensor> {
    if labels.dims() != logits.dims() {
        return Err(ModelError::InvalidConfig {
            field: "labels".to_string(),
            reason: format!(
                "shape {:?} does not match logits {:?}",
                labels.dims(),
                logits.dims()
            ),
        });
    }

    let log_probs = log_softmax(logits, D::Minus1)?;
    let per_row = (labels * log_probs)?.sum(D::Minus1)?.neg()?;
    Ok(per_row.mean_all()?)
}

/// Loss of `(N, d)` queries against their `(N, d)` positives, using the
/// other rows as negatives.
pub fn in_batch_softmax_loss(queries: &Tensor, candidates: &Tensor) -> Result<Tensor> {
    let scores = queries.matmul(&candidates.t()?)?;
    let (num_queries, num_candidates) = scores.dims2()?;
    let labels = identity_labels(num_queries, num_candidates, scores.device())?;
    categorical_crossentropy_from_logits(&labels, &scores)
}
