//! Domain types for the trained risk model and its artefact.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::config::{self, AppCfg};
use crate::common::error::RiskResult;
use crate::evaluation::domain::EvalSuite;
use crate::network::{check_ess, BayesianNetwork, Estimator};

/// Version of the JSON artefact layout written by [`super::repo_fs::FsModelRepo`].
pub const ARTEFACT_VERSION: u32 = 1;

/// Identifier derived from the training data fingerprint and the config.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Knobs that change the fitted model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub test_size: f64,
    pub seed: u64,
    pub estimator: Estimator,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::from_cfg(&AppCfg::default())
    }
}

impl TrainConfig {
    pub fn from_cfg(cfg: &AppCfg) -> Self {
        Self {
            test_size: cfg.test_size,
            seed: cfg.seed,
            estimator: cfg.estimator,
        }
    }

    /// Environment configuration with command-line overrides applied on top.
    pub fn with_overrides(cfg: &AppCfg, overrides: &TrainOverrides) -> RiskResult<Self> {
        let mut train = Self::from_cfg(cfg);
        if let Some(raw) = &overrides.test_size {
            train.test_size = config::parse_test_size(raw)?;
        }
        if let Some(seed) = overrides.seed {
            train.seed = seed;
        }
        match (&overrides.estimator, overrides.ess) {
            (Some(raw), ess) => {
                // Without an explicit ess, Bayes keeps the configured prior strength.
                let ess = ess.or(match cfg.estimator {
                    Estimator::Bayes {
                        equivalent_sample_size,
                    } => Some(equivalent_sample_size),
                    Estimator::MaximumLikelihood => None,
                });
                train.estimator = Estimator::parse(raw, ess)?;
            }
            (None, Some(ess)) => {
                let ess = check_ess(ess)?;
                if let Estimator::Bayes { .. } = train.estimator {
                    train.estimator = Estimator::Bayes {
                        equivalent_sample_size: ess,
                    };
                }
            }
            (None, None) => {}
        }
        Ok(train)
    }

    /// Stable textual key, used for model ids and cache lookups.
    pub fn key(&self) -> String {
        format!("test_size={};seed={};estimator={}", self.test_size, self.seed, self.estimator)
    }
}

/// Training knobs given on the command line. `None` keeps the configured value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainOverrides {
    pub test_size: Option<String>,
    pub seed: Option<u64>,
    pub estimator: Option<String>,
    pub ess: Option<f64>,
}

/// Where the model's parameters came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub source: PathBuf,
    pub dataset_fingerprint: String,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fitted network plus everything the page needs to describe it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskModel {
    pub format_version: u32,
    pub id: ModelId,
    pub created_at: DateTime<Utc>,
    pub config: TrainConfig,
    pub lineage: Lineage,
    pub evaluation: EvalSuite,
    pub network: BayesianNetwork,
}

impl RiskModel {
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }
}

/// Repository contract for model artefacts.
pub trait ModelRepo {
    fn put_model(&self, model: &RiskModel) -> RiskResult<PathBuf>;
    fn get_model(&self) -> RiskResult<RiskModel>;
}
