//! Training domain: fixed risk graph, fitting, artefacts and the model cache.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{ModelId, RiskModel, TrainConfig, TrainOverrides};
pub use service::ModelCache;
