//! Metric computation on the hold-out split.

use std::time::Instant;

use crate::common::error::{RiskError, RiskResult};
use crate::common::{log, time};
use crate::data::domain::Record;
use crate::inference::service as inference_service;
use crate::network::BayesianNetwork;

use super::domain::{Confusion, EvalSuite};

/// Fraction of positions where `predicted` equals `actual`.
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> RiskResult<f64> {
    if predicted.is_empty() {
        return Err(RiskError::invalid("accuracy of an empty prediction set"));
    }
    if predicted.len() != actual.len() {
        return Err(RiskError::invalid(format!(
            "{} predictions for {} labels",
            predicted.len(),
            actual.len()
        )));
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(hits as f64 / predicted.len() as f64)
}

/// Confusion counts, treating state 1 as the positive class.
pub fn confusion(predicted: &[usize], actual: &[usize]) -> Confusion {
    let mut out = Confusion::default();
    for (p, a) in predicted.iter().zip(actual) {
        match (*a == 1, *p == 1) {
            (false, false) => out.tn += 1,
            (false, true) => out.fp += 1,
            (true, false) => out.fn_ += 1,
            (true, true) => out.tp += 1,
        }
    }
    out
}

/// Predict the outcome of every test record from its risk factors and score the result.
pub fn evaluate(network: &BayesianNetwork, test: &[Record]) -> RiskResult<EvalSuite> {
    let start = Instant::now();
    let result = inference_service::batch_predict(network, test).and_then(|predicted| {
        let actual: Vec<usize> = test.iter().map(Record::outcome).collect();
        Ok(EvalSuite {
            accuracy: accuracy(&predicted, &actual)?,
            n_test: test.len(),
            confusion: confusion(&predicted, &actual),
        })
    });
    log::log_outcome("evaluation", "evaluate", &result, time::elapsed_ms(start));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 1, 1, 0]).unwrap(), 0.5);
        assert!(accuracy(&[], &[]).is_err());
        assert!(accuracy(&[1], &[1, 0]).is_err());
    }

    #[test]
    fn confusion_uses_state_one_as_positive() {
        let c = confusion(&[1, 0, 1, 0, 1], &[1, 1, 0, 0, 1]);
        assert_eq!(c.as_matrix(), [[1, 1], [1, 2]]);
    }
}
