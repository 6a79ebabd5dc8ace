//! Mini-batch training with AdamW and a decaying learning rate.

use crate::config::TrainingConfig;
use crate::error::Result;
use crate::evaluation::mean_loss;
use crate::model::SequentialRetrievalModel;
use crate::schedule::PolynomialDecay;
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use pipeline::Batch;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Losses recorded at the end of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f32,
    /// `None` when no validation batches were supplied.
    pub validation_loss: Option<f32>,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Drives optimization of a [`SequentialRetrievalModel`].
///
/// Training happens on the caller's thread. The optimizer writes parameters
/// in place, which the model's retrieval operator observes directly.
pub struct Trainer<'a> {
    model: &'a SequentialRetrievalModel,
    optimizer: AdamW,
    config: TrainingConfig,
    step: usize,
}

impl<'a> Trainer<'a> {
    pub fn new(model: &'a SequentialRetrievalModel, config: TrainingConfig) -> Result<Self> {
        let params = ParamsAdamW {
            lr: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            eps: config.eps,
            weight_decay: config.weight_decay,
        };
        let optimizer = AdamW::new(model.varmap().all_vars(), params)?;

        Ok(Self {
            model,
            optimizer,
            config,
            step: 0,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    /// One forward/backward pass and parameter update. Returns the batch loss.
    pub fn step(&mut self, batch: &Batch) -> Result<f32> {
        let loss = self.model.batch_loss(batch)?;
        self.optimizer.backward_step(&loss)?;
        self.step += 1;

        let loss = loss.to_scalar::<f32>()?;
        debug!(step = self.step, loss, "Training step");
        Ok(loss)
    }

    /// Run all configured epochs over `train`, evaluating on `validation`
    /// after each one.
    #[instrument(skip_all, fields(train_batches = train.len(), validation_batches = validation.len()))]
    pub fn fit(&mut self, train: &[Batch], validation: &[Batch]) -> Result<TrainingHistory> {
        let schedule = PolynomialDecay::linear(
            self.config.learning_rate,
            self.config.end_learning_rate,
            train.len() * self.config.epochs,
        );
        let mut history = TrainingHistory::default();
        let first_step = self.step;

        for epoch in 1..=self.config.epochs {
            let start = Instant::now();
            let mut total_loss = 0.0f32;

            for batch in train {
                self.optimizer
                    .set_learning_rate(schedule.rate(self.step - first_step));
                total_loss += self.step(batch)?;
            }
            self.optimizer
                .set_learning_rate(schedule.rate(self.step - first_step));

            let train_loss = if train.is_empty() {
                0.0
            } else {
                total_loss / train.len() as f32
            };
            let validation_loss = if validation.is_empty() {
                None
            } else {
                Some(mean_loss(self.model, validation)?)
            };

            info!(
                epoch,
                train_loss,
                validation_loss = ?validation_loss,
                learning_rate = self.learning_rate(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Epoch complete"
            );

            history.epochs.push(EpochMetrics {
                epoch,
                train_loss,
                validation_loss,
                learning_rate: self.learning_rate(),
            });
        }

        Ok(history)
    }
}
