//! Inference domain: form evidence, posterior queries and predictions.

pub mod domain;
pub mod service;

pub use domain::{Evidence, PatientForm, Posterior, PosteriorRow};
