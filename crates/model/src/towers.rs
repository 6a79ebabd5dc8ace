//! Query and candidate encoders.

use crate::error::{ModelError, Result};
use candle_core::{D, Tensor};
use candle_nn::rnn::{GRU, GRUConfig, RNN, gru};
use candle_nn::{Embedding, Module, VarBuilder, embedding};

/// Encodes a left-padded history into a single vector.
///
/// Item embeddings are fed through a GRU whose hidden size equals the
/// embedding width. The last hidden state is the query embedding.
#[derive(Debug, Clone)]
pub struct QueryTower {
    embedding: Embedding,
    gru: GRU,
}

impl QueryTower {
    pub fn new(num_items: usize, embedding_dim: usize, vb: VarBuilder) -> Result<Self> {
        let embedding = embedding(num_items, embedding_dim, vb.pp("embedding"))?;
        let gru = gru(
            embedding_dim,
            embedding_dim,
            GRUConfig::default(),
            vb.pp("gru"),
        )?;
        Ok(Self { embedding, gru })
    }

    /// `(n, L)` u32 item ids to `(n, d)` embeddings.
    pub fn forward(&self, context_item_ids: &Tensor) -> Result<Tensor> {
        let (batch_size, context_length) = context_item_ids.dims2()?;
        if context_length == 0 {
            return Err(ModelError::EmptyContext);
        }

        let xs = self.embedding.forward(context_item_ids)?;
        let mut state = self.gru.zero_state(batch_size)?;
        for position in 0..context_length {
            let x = xs.narrow(1, position, 1)?.squeeze(1)?.contiguous()?;
            state = self.gru.step(&x, &state)?;
        }
        Ok(state.h().clone())
    }
}

/// Plain embedding lookup for candidate items.
#[derive(Debug, Clone)]
pub struct CandidateTower {
    embedding: Embedding,
}

impl CandidateTower {
    pub fn new(num_items: usize, embedding_dim: usize, vb: VarBuilder) -> Result<Self> {
        let embedding = embedding(num_items, embedding_dim, vb.pp("embedding"))?;
        Ok(Self { embedding })
    }

    /// `(n,)` u32 item ids to `(n, d)` embeddings.
    pub fn forward(&self, item_ids: &Tensor) -> Result<Tensor> {
        Ok(self.embedding.forward(item_ids)?)
    }

    /// The full `(num_items, d)` table.
    ///
    /// The returned tensor shares storage with the trained variable, so
    /// optimizer updates are visible through it.
    pub fn table(&self) -> &Tensor {
        self.embedding.embeddings()
    }
}

/// Row-wise inner product of two `(n, d)` tensors.
pub fn dot_rows(lhs: &Tensor, rhs: &Tensor) -> Result<Tensor> {
    Ok((lhs * rhs)?.sum(D::Minus1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_query_tower_shapes() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let tower = QueryTower::new(20, 8, vb.pp("query_tower")).unwrap();

        let context = Tensor::new(&[[0u32, 3, 4], [5, 6, 7]], &device).unwrap();
        let encoded = tower.forward(&context).unwrap();

        assert_eq!(encoded.dims(), &[2, 8]);
        let names: Vec<String> = varmap.data().lock().unwrap().keys().cloned().collect();
        assert!(names.contains(&"query_tower.embedding.weight".to_string()));
        assert!(names.iter().any(|n| n.starts_with("query_tower.gru.")));
    }

    #[test]
    fn test_query_tower_rejects_empty_context() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let tower = QueryTower::new(5, 4, vb).unwrap();

        let context = Tensor::zeros((2, 0), DType::U32, &device).unwrap();
        assert!(matches!(
            tower.forward(&context),
            Err(ModelError::EmptyContext)
        ));
    }

    #[test]
    fn test_candidate_tower_is_table_lookup() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let tower = CandidateTower::new(6, 4, vb).unwrap();

        let ids = Tensor::new(&[2u32, 5], &device).unwrap();
        let encoded = tower.forward(&ids).unwrap().to_vec2::<f32>().unwrap();
        let table = tower.table().to_vec2::<f32>().unwrap();

        assert_eq!(encoded[0], table[2]);
        assert_eq!(encoded[1], table[5]);
    }

    #[test]
    fn test_dot_rows() {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2.], [3., 4.]], &device).unwrap();
        let b = Tensor::new(&[[5f32, 6.], [7., 8.]], &device).unwrap();

        let dots = dot_rows(&a, &b).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(dots, vec![17., 53.]);
    }
}
