//! Discrete Bayesian networks: graph, tabular CPDs, parameter estimation and
//! exact inference by variable elimination.
//!
//! Scoped to what the risk model needs; there is no structure learning and
//! no approximate inference.

pub mod cpd;
pub mod dag;
pub mod factor;
pub mod model;

pub use cpd::{check_ess, Estimator, TabularCpd, Variable, DEFAULT_ESS};
pub use dag::Dag;
pub use factor::Factor;
pub use model::{Assignment, BayesianNetwork};
