// lib.rs - cardiac risk decision support
pub mod api;
pub mod common;
pub mod data;
pub mod evaluation;
pub mod inference;
pub mod network;
pub mod training;

#[cfg(test)]
pub(crate) mod testing;

pub use common::{RiskCode, RiskError, RiskResult};
pub use inference::{Evidence, PatientForm, Posterior};
pub use training::{ModelCache, RiskModel, TrainConfig};
