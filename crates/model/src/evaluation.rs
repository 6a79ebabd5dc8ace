//! Held-out metrics.

use crate::error::Result;
use crate::model::{SequentialRetrievalModel, batch_to_tensors};
use pipeline::Batch;
use tracing::info;

/// Example-weighted mean in-batch loss over `batches`. Zero for no batches.
pub fn mean_loss(model: &SequentialRetrievalModel, batches: &[Batch]) -> Result<f32> {
    let mut total = 0.0f32;
    let mut examples = 0usize;

    for batch in batches {
        let loss = model.batch_loss(batch)?.to_scalar::<f32>()?;
        total += loss * batch.len() as f32;
        examples += batch.len();
    }

    if examples == 0 {
        return Ok(0.0);
    }
    Ok(total / examples as f32)
}

/// Fraction of examples whose label is among the model's top-k retrieved
/// items (retrieval over the whole catalog, not in-batch).
pub fn hit_rate_at_k(model: &SequentialRetrievalModel, batches: &[Batch]) -> Result<f32> {
    let mut hits = 0usize;
    let mut examples = 0usize;

    for batch in batches {
        let (context, _) = batch_to_tensors(batch, model.device())?;
        let retrieved = model.predict(&context)?;

        hits += retrieved
            .item_ids
            .iter()
            .zip(batch.label_item_ids())
            .filter(|(top_k, label)| top_k.contains(*label))
            .count();
        examples += batch.len();
    }

    let hit_rate = if examples == 0 {
        0.0
    } else {
        hits as f32 / examples as f32
    };
    info!(hits, examples, hit_rate, k = model.config().top_k, "Evaluated hit rate");
    Ok(hit_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use candle_core::Device;
    use pipeline::TrainingExample;

    #[test]
    fn test_full_catalog_is_always_a_hit() {
        // top_k covers every row, so every label is retrieved
        let model =
            SequentialRetrievalModel::new(ModelConfig::new(5, 4).top_k(5), &Device::Cpu).unwrap();
        let examples: Vec<TrainingExample> = (1..=4)
            .map(|i| TrainingExample {
                context_item_ids: vec![0, i],
                label_item_id: (i % 4) + 1,
            })
            .collect();
        let batch = Batch::from_examples(&examples).unwrap();

        assert_eq!(hit_rate_at_k(&model, &[batch]).unwrap(), 1.0);
    }

    #[test]
    fn test_empty_batches() {
        let model = SequentialRetrievalModel::new(ModelConfig::new(5, 4), &Device::Cpu).unwrap();

        assert_eq!(hit_rate_at_k(&model, &[]).unwrap(), 0.0);
        assert_eq!(mean_loss(&model, &[]).unwrap(), 0.0);
    }
}
