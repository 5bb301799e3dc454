//! Service layer orchestrating model fitting, persistence and the process-wide cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::info;

use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::Fingerprint;
use crate::common::{log, time};
use crate::data::domain::{self, Dataset};
use crate::data::service as data_service;
use crate::evaluation::service as evaluation_service;
use crate::network::{BayesianNetwork, Dag};

use super::domain::{Lineage, ModelId, ModelRepo, RiskModel, TrainConfig, ARTEFACT_VERSION};
use super::repo_fs::FsModelRepo;

/// The nine `(risk factor, outcome)` edges of the model.
pub fn risk_edges() -> Vec<(&'static str, &'static str)> {
    domain::risk_factors()
        .iter()
        .map(|c| (c.name, domain::TARGET))
        .collect()
}

/// Graph built from [`risk_edges`].
pub fn risk_dag() -> RiskResult<Dag> {
    Dag::from_edges(risk_edges())
}

/// Split `dataset`, fit the network on the training part and score it on the rest.
pub fn train(dataset: &Dataset, cfg: &TrainConfig) -> RiskResult<RiskModel> {
    let start = Instant::now();
    let result = fit_and_evaluate(dataset, cfg);
    log::log_outcome("training", "train", &result, time::elapsed_ms(start));
    if let Ok(model) = &result {
        info!(
            model_id = %model.id,
            n_train = model.lineage.n_train,
            n_test = model.lineage.n_test,
            accuracy = model.accuracy(),
            "model trained"
        );
    }
    result
}

fn fit_and_evaluate(dataset: &Dataset, cfg: &TrainConfig) -> RiskResult<RiskModel> {
    let split = data_service::train_test_split(dataset, cfg.test_size, cfg.seed)?;
    let network = BayesianNetwork::fit(
        risk_dag()?,
        &domain::schema_variables(),
        &split.train,
        cfg.estimator,
    )?;
    let evaluation = evaluation_service::evaluate(&network, &split.test)?;

    Ok(RiskModel {
        format_version: ARTEFACT_VERSION,
        id: model_id(&dataset.fingerprint, cfg),
        created_at: time::now_utc(),
        config: *cfg,
        lineage: Lineage {
            source: dataset.source.clone(),
            dataset_fingerprint: dataset.fingerprint.clone(),
            n_train: split.train.len(),
            n_test: split.test.len(),
        },
        evaluation,
        network,
    })
}

fn model_id(fingerprint: &str, cfg: &TrainConfig) -> ModelId {
    let mut hasher = Fingerprint::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(cfg.key().as_bytes());
    ModelId::new(format!("risk-{}", hasher.finish_short()))
}

/// Load a CSV, train, and write the artefact. Returns the model and where it was written.
pub fn train_to_file(data: &Path, out: &Path, cfg: &TrainConfig) -> RiskResult<(RiskModel, PathBuf)> {
    let dataset = data_service::load_dataset(data)?;
    let model = train(&dataset, cfg)?;
    let path = FsModelRepo::at(out).put_model(&model)?;
    info!(path = %path.display(), "model artefact written");
    Ok((model, path))
}

/// Load a previously written artefact and check it is the fixed risk model.
pub fn load_model(path: &Path) -> RiskResult<RiskModel> {
    let start = Instant::now();
    let result = FsModelRepo::at(path)
        .get_model()
        .and_then(|model| check_structure(&model.network).map(|()| model));
    log::log_outcome("training", "load_model", &result, time::elapsed_ms(start));
    result
}

/// The network must carry exactly the risk edges over the schema's variables,
/// with state labels in encoding order.
fn check_structure(network: &BayesianNetwork) -> RiskResult<()> {
    let edges: Vec<(&str, &str)> = network
        .dag()
        .edges()
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    if edges != risk_edges() {
        return Err(RiskError::model_missing(
            "artefact network does not have the risk-factor edges",
        ));
    }
    let schema = domain::schema_variables();
    if network.variables().len() != schema.len() {
        return Err(RiskError::model_missing(format!(
            "artefact network has {} variables, expected {}",
            network.variables().len(),
            schema.len()
        )));
    }
    for variable in network.variables() {
        let expected = schema.iter().find(|v| v.name == variable.name);
        if expected != Some(variable) {
            return Err(RiskError::model_missing(format!(
                "artefact variable {} does not match the schema",
                variable.name
            )));
        }
    }
    Ok(())
}

/// Process-wide memo of loaded datasets and trained models.
///
/// Datasets are keyed by path, models by dataset fingerprint plus config key.
/// Entries live for the lifetime of the process.
#[derive(Default)]
pub struct ModelCache {
    datasets: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
    models: Mutex<HashMap<(String, String), Arc<RiskModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared instance used by the server.
    pub fn global() -> &'static ModelCache {
        static CACHE: OnceLock<ModelCache> = OnceLock::new();
        CACHE.get_or_init(ModelCache::new)
    }

    pub fn dataset(&self, path: &Path) -> RiskResult<Arc<Dataset>> {
        let mut datasets = self.datasets.lock();
        if let Some(hit) = datasets.get(path) {
            return Ok(Arc::clone(hit));
        }
        let dataset = Arc::new(data_service::load_dataset(path)?);
        datasets.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn model(&self, dataset: &Dataset, cfg: &TrainConfig) -> RiskResult<Arc<RiskModel>> {
        let key = (dataset.fingerprint.clone(), cfg.key());
        let mut models = self.models.lock();
        if let Some(hit) = models.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let model = Arc::new(train(dataset, cfg)?);
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Load (or reuse) the dataset at `path`, then train (or reuse) the model.
    pub fn get_or_train(&self, path: &Path, cfg: &TrainConfig) -> RiskResult<Arc<RiskModel>> {
        let dataset = self.dataset(path)?;
        self.model(&dataset, cfg)
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
