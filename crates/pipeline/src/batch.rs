//! Columnar batches of training examples.

use crate::error::{PipelineError, Result};
use crate::examples::{ItemId, TrainingExample};
use std::fmt;

/// A batch of examples stored column-wise.
///
/// `context_item_ids` is a row-major `len × context_length` buffer and
/// `label_item_ids` has one entry per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    context_item_ids: Vec<ItemId>,
    label_item_ids: Vec<ItemId>,
    context_length: usize,
}

impl Batch {
    /// Stack examples into a batch.
    ///
    /// Fails on an empty slice and when any context length differs from the
    /// first one (or is zero).
    pub fn from_examples(examples: &[TrainingExample]) -> Result<Self> {
        let first = examples.first().ok_or(PipelineError::EmptyBatch)?;
        let context_length = first.context_item_ids.len();

        let mut context_item_ids = Vec::with_capacity(examples.len() * context_length);
        let mut label_item_ids = Vec::with_capacity(examples.len());

        for (index, example) in examples.iter().enumerate() {
            let found = example.context_item_ids.len();
            if found != context_length || found == 0 {
                return Err(PipelineError::ContextLengthMismatch {
                    index,
                    expected: context_length.max(1),
                    found,
                });
            }
            context_item_ids.extend_from_slice(&example.context_item_ids);
            label_item_ids.push(example.label_item_id);
        }

        Ok(Self {
            context_item_ids,
            label_item_ids,
            context_length,
        })
    }

    /// Number of examples (the shared leading dimension).
    pub fn len(&self) -> usize {
        self.label_item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_item_ids.is_empty()
    }

    pub fn context_length(&self) -> usize {
        self.context_length
    }

    /// Flat row-major context buffer.
    pub fn context_item_ids(&self) -> &[ItemId] {
        &self.context_item_ids
    }

    pub fn label_item_ids(&self) -> &[ItemId] {
        &self.label_item_ids
    }

    /// Context row `index`.
    pub fn context(&self, index: usize) -> &[ItemId] {
        let start = index * self.context_length;
        &self.context_item_ids[start..start + self.context_length]
    }

    /// Iterate `(context, label)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (&[ItemId], ItemId)> + '_ {
        self.context_item_ids
            .chunks_exact(self.context_length)
            .zip(self.label_item_ids.iter().copied())
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch(size={}, context_length={})",
            self.len(),
            self.context_length
        )?;
        for (context, label) in self.rows() {
            writeln!(f, "  context={:?} label={}", context, label)?;
        }
        Ok(())
    }
}

/// Cut `examples` into consecutive batches of `batch_size`.
///
/// The last batch holds the remainder and may be smaller.
pub fn batch_examples(examples: &[TrainingExample], batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(PipelineError::InvalidConfig {
            field: "batch_size".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    examples
        .chunks(batch_size)
        .map(Batch::from_examples)
        .collect()
}
