//! Domain primitives for hold-out evaluation.

use serde::{Deserialize, Serialize};

/// Binary confusion counts for the outcome, `[[tn, fp], [fn, tp]]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl Confusion {
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

/// Summary of evaluation metrics for a fitted model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalSuite {
    pub accuracy: f64,
    pub n_test: usize,
    pub confusion: Confusion,
}
