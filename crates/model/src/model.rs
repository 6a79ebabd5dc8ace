//! The two-tower sequential retrieval model.

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::loss::in_batch_softmax_loss;
use crate::retrieval::{BruteForceRetrieval, Retrieved};
use crate::towers::{CandidateTower, QueryTower, dot_rows};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use pipeline::{Batch, ItemId, TrainingExample, pad_context};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Metadata key holding the JSON-encoded [`ModelConfig`] in saved archives.
pub const CONFIG_METADATA_KEY: &str = "config";

/// Query tower (embedding + GRU) and candidate tower (embedding) trained
/// with in-batch negatives, plus brute-force retrieval over the candidate
/// table.
///
/// All parameters live in one [`VarMap`]. The retrieval operator reads the
/// candidate tower's table directly, so it always ranks against the
/// current weights.
pub struct SequentialRetrievalModel {
    config: ModelConfig,
    device: Device,
    varmap: VarMap,
    query_tower: QueryTower,
    candidate_tower: CandidateTower,
    retrieval: BruteForceRetrieval,
}

impl SequentialRetrievalModel {
    /// Build a freshly initialized model.
    pub fn new(config: ModelConfig, device: &Device) -> Result<Self> {
        config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let query_tower = QueryTower::new(
            config.num_items,
            config.embedding_dim,
            vb.pp("query_tower"),
        )?;
        let candidate_tower = CandidateTower::new(
            config.num_items,
            config.embedding_dim,
            vb.pp("candidate_tower"),
        )?;
        let retrieval =
            BruteForceRetrieval::new(candidate_tower.table().clone(), config.top_k, false)?;

        Ok(Self {
            config,
            device: device.clone(),
            varmap,
            query_tower,
            candidate_tower,
            retrieval,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Every trainable parameter.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// The live `(num_items, d)` candidate embedding table.
    pub fn candidate_table(&self) -> &Tensor {
        self.candidate_tower.table()
    }

    /// `(n, L)` context ids to `(n, d)` query embeddings.
    pub fn encode_query(&self, context_item_ids: &Tensor) -> Result<Tensor> {
        self.query_tower.forward(context_item_ids)
    }

    /// `(n,)` item ids to `(n, d)` candidate embeddings.
    pub fn encode_candidate(&self, item_ids: &Tensor) -> Result<Tensor> {
        self.candidate_tower.forward(item_ids)
    }

    /// Row-wise affinity of paired queries and candidates, shape `(n,)`.
    pub fn score(&self, queries: &Tensor, candidates: &Tensor) -> Result<Tensor> {
        dot_rows(queries, candidates)
    }

    /// Affinity of every query with every candidate, shape `(n, m)`.
    pub fn score_matrix(&self, queries: &Tensor, candidates: &Tensor) -> Result<Tensor> {
        Ok(queries.matmul(&candidates.t()?)?)
    }

    /// Scalar in-batch softmax loss for `(n, L)` contexts and `(n,)` labels.
    pub fn compute_loss(&self, context_item_ids: &Tensor, label_item_ids: &Tensor) -> Result<Tensor> {
        let queries = self.encode_query(context_item_ids)?;
        let candidates = self.encode_candidate(label_item_ids)?;
        in_batch_softmax_loss(&queries, &candidates)
    }

    /// Loss for a pipeline batch.
    pub fn batch_loss(&self, batch: &Batch) -> Result<Tensor> {
        let (context, labels) = batch_to_tensors(batch, &self.device)?;
        self.compute_loss(&context, &labels)
    }

    /// Top-k item ids for each `(n, L)` context row.
    pub fn predict(&self, context_item_ids: &Tensor) -> Result<Retrieved> {
        let queries = self.encode_query(context_item_ids)?;
        self.retrieval.retrieve(&queries)
    }

    /// Top-k item ids for a batch of examples. Labels are ignored.
    pub fn predict_examples(&self, examples: &[TrainingExample]) -> Result<Retrieved> {
        let batch = Batch::from_examples(examples)?;
        let (context, _) = batch_to_tensors(&batch, &self.device)?;
        self.predict(&context)
    }

    /// Top-k item ids for one user's history, oldest first.
    ///
    /// The history is left-padded or cut to the configured window, keeping
    /// the most recent items.
    pub fn recommend(&self, history: &[ItemId]) -> Result<Vec<ItemId>> {
        if history.is_empty() {
            return Err(ModelError::EmptyContext);
        }
        let window = self.config.context_length;
        let context = Tensor::from_vec(pad_context(history, window), (1, window), &self.device)?;
        let retrieved = self.predict(&context)?;
        Ok(retrieved.item_ids.into_iter().next().unwrap_or_default())
    }

    /// Write all parameters and the configuration to one safetensors file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let tensors: Vec<(String, Tensor)> = {
            let data = self
                .varmap
                .data()
                .lock()
                .map_err(|_| ModelError::PoisonedParameters)?;
            data.iter()
                .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
                .collect()
        };

        let metadata = HashMap::from([(
            CONFIG_METADATA_KEY.to_string(),
            serde_json::to_string(&self.config)?,
        )]);
        safetensors::serialize_to_file(
            tensors.iter().map(|(name, tensor)| (name.as_str(), tensor)),
            &Some(metadata),
            path.as_ref(),
        )?;

        info!(tensors = tensors.len(), "Saved model");
        Ok(())
    }

    /// Rebuild a model from a file written by [`save`](Self::save).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        let buffer = std::fs::read(path)?;

        let (_, header) = SafeTensors::read_metadata(&buffer)?;
        let config_json = header
            .metadata()
            .as_ref()
            .and_then(|metadata| metadata.get(CONFIG_METADATA_KEY))
            .ok_or_else(|| ModelError::MissingConfig {
                path: path.display().to_string(),
            })?;
        let config: ModelConfig = serde_json::from_str(config_json)?;

        let model = Self::new(config, device)?;
        let mut stored = candle_core::safetensors::load_buffer(&buffer, device)?;
        {
            let data = model
                .varmap
                .data()
                .lock()
                .map_err(|_| ModelError::PoisonedParameters)?;
            for (name, var) in data.iter() {
                let tensor = stored
                    .remove(name)
                    .ok_or_else(|| ModelError::MissingTensor { name: name.clone() })?;
                var.set(&tensor)?;
            }
        }
        if !stored.is_empty() {
            debug!(unused = stored.len(), "Archive holds tensors the model does not use");
        }

        info!(
            num_items = model.config.num_items,
            embedding_dim = model.config.embedding_dim,
            "Loaded model"
        );
        Ok(model)
    }
}

/// `(n, L)` context and `(n,)` label tensors for a batch.
pub fn batch_to_tensors(batch: &Batch, device: &Device) -> Result<(Tensor, Tensor)> {
    let context = Tensor::from_vec(
        batch.context_item_ids().to_vec(),
        (batch.len(), batch.context_length()),
        device,
    )?;
    let labels = Tensor::from_vec(batch.label_item_ids().to_vec(), batch.len(), device)?;
    Ok((context, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::PipelineError;

    fn model() -> SequentialRetrievalModel {
        let config = ModelConfig::new(12, 8).top_k(3).context_length(3);
        SequentialRetrievalModel::new(config, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_parameter_names() {
        let model = model();
        let data = model.varmap().data().lock().unwrap();

        assert!(data.contains_key("query_tower.embedding.weight"));
        assert!(data.contains_key("candidate_tower.embedding.weight"));
        assert!(data.keys().any(|name| name.starts_with("query_tower.gru.")));
    }

    #[test]
    fn test_score_matrix_diagonal_matches_score() {
        let model = model();
        let device = Device::Cpu;
        let context = Tensor::new(&[[0u32, 1, 2], [3, 4, 5]], &device).unwrap();
        let labels = Tensor::new(&[6u32, 7], &device).unwrap();

        let queries = model.encode_query(&context).unwrap();
        let candidates = model.encode_candidate(&labels).unwrap();
        let matrix = model.score_matrix(&queries, &candidates).unwrap();
        let paired = model.score(&queries, &candidates).unwrap().to_vec1::<f32>().unwrap();

        assert_eq!(matrix.dims(), &[2, 2]);
        let matrix = matrix.to_vec2::<f32>().unwrap();
        for i in 0..2 {
            assert!((matrix[i][i] - paired[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_predict_returns_top_k() {
        let model = model();
        let context = Tensor::new(&[[0u32, 0, 5]], &Device::Cpu).unwrap();

        let retrieved = model.predict(&context).unwrap();

        assert_eq!(retrieved.item_ids.len(), 1);
        assert_eq!(retrieved.item_ids[0].len(), 3);
        assert!(retrieved.item_ids[0].iter().all(|&id| id < 12));
        assert_eq!(model.recommend(&[0, 0, 5]).unwrap(), retrieved.item_ids[0]);
    }

    #[test]
    fn test_recommend_fits_history_to_window() {
        let model = model();
        let device = Device::Cpu;

        let short = Tensor::new(&[[0u32, 0, 5]], &device).unwrap();
        assert_eq!(
            model.recommend(&[5]).unwrap(),
            model.predict(&short).unwrap().item_ids[0]
        );

        let recent = Tensor::new(&[[7u32, 8, 9]], &device).unwrap();
        assert_eq!(
            model.recommend(&[1, 2, 3, 7, 8, 9]).unwrap(),
            model.predict(&recent).unwrap().item_ids[0]
        );
        assert!(matches!(model.recommend(&[]), Err(ModelError::EmptyContext)));
    }

    #[test]
    fn test_predict_examples() {
        let model = model();
        let examples = vec![
            TrainingExample {
                context_item_ids: vec![0, 1, 2],
                label_item_id: 3,
            },
            TrainingExample {
                context_item_ids: vec![4, 5, 6],
                label_item_id: 7,
            },
        ];

        let retrieved = model.predict_examples(&examples).unwrap();
        assert_eq!(retrieved.item_ids.len(), 2);
        assert_eq!(retrieved.item_ids[1], model.recommend(&[4, 5, 6]).unwrap());

        // Ragged contexts surface the batch error
        let ragged = vec![
            examples[0].clone(),
            TrainingExample {
                context_item_ids: vec![1],
                label_item_id: 2,
            },
        ];
        assert!(matches!(
            model.predict_examples(&ragged),
            Err(ModelError::Pipeline(PipelineError::ContextLengthMismatch { .. }))
        ));
        assert!(matches!(
            model.predict_examples(&[]),
            Err(ModelError::Pipeline(PipelineError::EmptyBatch))
        ));
    }

    #[test]
    fn test_batch_to_tensors() {
        let examples = vec![
            TrainingExample {
                context_item_ids: vec![0, 1],
                label_item_id: 2,
            },
            TrainingExample {
                context_item_ids: vec![1, 2],
                label_item_id: 3,
            },
        ];
        let batch = Batch::from_examples(&examples).unwrap();

        let (context, labels) = batch_to_tensors(&batch, &Device::Cpu).unwrap();

        assert_eq!(context.to_vec2::<u32>().unwrap(), vec![vec![0, 1], vec![1, 2]]);
        assert_eq!(labels.to_vec1::<u32>().unwrap(), vec![2, 3]);
        assert!(model().batch_loss(&batch).unwrap().to_scalar::<f32>().unwrap().is_finite());
    }

    #[test]
    fn test_load_without_config_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.safetensors");
        let tensor = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        safetensors::serialize_to_file([("weight", &tensor)], &None, &path).unwrap();

        assert!(matches!(
            SequentialRetrievalModel::load(&path, &Device::Cpu),
            Err(ModelError::MissingConfig { .. })
        ));
    }
}
