//! Service layer: dataset loading and the deterministic train/test split.

use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::common::error::{RiskError, RiskResult};
use crate::common::{log, time};

use super::domain::{Dataset, Split};
use super::repo_fs;

/// Load and encode the CSV dataset at `path`.
pub fn load_dataset(path: &Path) -> RiskResult<Dataset> {
    let start = Instant::now();
    let result = repo_fs::read_csv(path).and_then(|dataset| {
        if dataset.is_empty() {
            Err(RiskError::invalid(format!("{} has no rows", path.display())))
        } else {
            Ok(dataset)
        }
    });
    log::log_outcome("data", "load_dataset", &result, time::elapsed_ms(start));
    if let Ok(dataset) = &result {
        tracing::debug!(rows = dataset.len(), fingerprint = %dataset.fingerprint, "dataset loaded");
    }
    result
}

/// Shuffle with a seeded RNG and hold out `ceil(n * test_size)` rows.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64) -> RiskResult<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(RiskError::invalid(format!(
            "test size must be in (0, 1), got {test_size}"
        )));
    }
    let n = dataset.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n < 2 || n_test == 0 || n_test >= n {
        return Err(RiskError::invalid(format!(
            "cannot split {n} rows with test size {test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].iter().map(|i| dataset.records[*i]).collect();
    let train = indices[n_test..].iter().map(|i| dataset.records[*i]).collect();
    Ok(Split { train, test })
}
