//! Runtime configuration loaded from the environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;

use super::error::{RiskError, RiskResult};
use crate::data::repo_fs::FsDataRepo;
use crate::network::{check_ess, Estimator};
use crate::training::repo_fs::FsModelRepo;

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: PathBuf,
    pub dataset: String,
    pub model_path: PathBuf,
    pub bind: String,
    pub test_size: f64,
    pub seed: u64,
    pub estimator: Estimator,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            dataset: "dataset_risque_cardiaque.csv".to_string(),
            model_path: PathBuf::from("models/model.json"),
            bind: "127.0.0.1:8501".to_string(),
            test_size: 0.2,
            seed: 42,
            estimator: Estimator::default(),
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    /// Any value that does not parse is an error.
    pub fn try_load() -> RiskResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> RiskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let test_size = match lookup("CARDIORISK_TEST_SIZE") {
            Some(raw) => parse_test_size(&raw)?,
            None => defaults.test_size,
        };
        let seed = match lookup("CARDIORISK_SEED") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| RiskError::invalid(format!("CARDIORISK_SEED={raw}")))?,
            None => defaults.seed,
        };
        let ess = match lookup("CARDIORISK_ESS") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| RiskError::invalid(format!("CARDIORISK_ESS={raw}")))
                    .and_then(check_ess)?,
            ),
            None => None,
        };
        let estimator = match lookup("CARDIORISK_ESTIMATOR") {
            Some(raw) => Estimator::parse(&raw, ess)?,
            None => Estimator::parse("bayes", ess)?,
        };

        Ok(Self {
            data_root: lookup("CARDIORISK_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            dataset: lookup("CARDIORISK_DATASET").unwrap_or(defaults.dataset),
            model_path: lookup("CARDIORISK_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            bind: lookup("CARDIORISK_BIND").unwrap_or(defaults.bind),
            test_size,
            seed,
            estimator,
        })
    }

    /// Full path of the configured dataset.
    pub fn dataset_path(&self) -> PathBuf {
        FsDataRepo::new(self).resolve(&self.dataset)
    }

    /// Full path of the configured model artefact.
    pub fn artefact_path(&self) -> PathBuf {
        FsModelRepo::new(self).path().to_path_buf()
    }
}

/// Parse a hold-out fraction, which must lie strictly between 0 and 1.
pub fn parse_test_size(raw: &str) -> RiskResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0 && *v < 1.0)
        .ok_or_else(|| RiskError::invalid(format!("test size must be in (0, 1), got {raw}")))
}
