//! Shared helpers for tests across the workspace.
//!
//! Tensor comparisons with NumPy `allclose` semantics, a save/load
//! round-trip harness for persisted models, and a tracing subscriber that
//! writes through the test harness.

use anyhow::{Context, Result};
use candle_core::{DType, Tensor};
use std::path::Path;
use std::sync::Once;

/// File name used inside the temporary directory by
/// [`run_model_saving_test`].
pub const SAVED_MODEL_FILE_NAME: &str = "model.safetensors";

/// A model that can be written to disk, read back, and run.
pub trait SavableModel: Sized {
    type Input: ?Sized;

    /// Deterministic output for `input`.
    fn predict(&self, input: &Self::Input) -> Result<Tensor>;

    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>;
}

fn flat_f64(tensor: &Tensor) -> Result<Vec<f64>> {
    Ok(tensor.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?)
}

/// Panics unless `actual` and `desired` have the same shape and
/// `|actual - desired| <= atol + rtol * |desired|` holds element-wise.
pub fn assert_all_close(actual: &Tensor, desired: &Tensor, atol: f64, rtol: f64, msg: &str) {
    assert_eq!(
        actual.dims(),
        desired.dims(),
        "{msg}: shape mismatch"
    );

    let actual_values = flat_f64(actual).expect("actual tensor is not numeric");
    let desired_values = flat_f64(desired).expect("desired tensor is not numeric");

    let mismatches: Vec<(usize, f64, f64)> = actual_values
        .iter()
        .zip(&desired_values)
        .enumerate()
        .filter(|&(_, (&a, &d))| !((a - d).abs() <= atol + rtol * d.abs()))
        .map(|(i, (&a, &d))| (i, a, d))
        .collect();

    assert!(
        mismatches.is_empty(),
        "{msg}: {} of {} elements differ (atol={atol}, rtol={rtol}), first at index {} ({} vs {})",
        mismatches.len(),
        actual_values.len(),
        mismatches[0].0,
        mismatches[0].1,
        mismatches[0].2
    );
}

/// Panics unless both tensors have the same shape and identical values.
pub fn assert_all_equal(actual: &Tensor, desired: &Tensor, msg: &str) {
    assert_all_close(actual, desired, 0.0, 0.0, msg);
}

/// Build a model, save it into a fresh temporary directory, load it back
/// and check both produce the same output for `input`.
pub fn run_model_saving_test<M, F>(build: F, input: &M::Input, atol: f64, rtol: f64) -> Result<()>
where
    M: SavableModel,
    F: FnOnce() -> Result<M>,
{
    let model = build().context("building model")?;
    let expected = model.predict(input).context("predicting before save")?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join(SAVED_MODEL_FILE_NAME);
    model.save(&path).context("saving model")?;

    let restored = M::load(&path).context("loading model")?;
    let actual = restored.predict(input).context("predicting after load")?;

    assert_all_close(&actual, &expected, atol, rtol, "restored model output");
    Ok(())
}

static TRACING: Once = Once::new();

/// Route `tracing` output through the test writer. Safe to call from every
/// test.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
