//! Hold-out evaluation of fitted models.

pub mod domain;
pub mod service;

pub use domain::{Confusion, EvalSuite};
