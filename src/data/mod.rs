//! Data domain: fixed schema, categorical encoding and CSV loading.

pub mod domain;
pub mod encoding;
pub mod repo_fs;
pub mod service;

pub use domain::{ColumnSpec, Dataset, Record, Split, SCHEMA, TARGET};
