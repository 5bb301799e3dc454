//! Inference orchestration: posterior queries and MAP predictions.

use std::time::Instant;

use rayon::prelude::*;

use crate::common::error::{RiskError, RiskResult};
use crate::common::{log, time};
use crate::data::domain::{Record, TARGET};
use crate::network::BayesianNetwork;
use crate::training::domain::RiskModel;

use super::domain::{Evidence, Posterior, PosteriorRow};

/// Posterior of the outcome given `evidence`, with raw (unrounded) probabilities.
pub fn query_risk(model: &RiskModel, evidence: &Evidence) -> RiskResult<Posterior> {
    let start = Instant::now();
    let result = query(&model.network, TARGET, evidence);
    log::log_outcome("inference", "query_risk", &result, time::elapsed_ms(start));
    result
}

/// Posterior of any single network variable.
pub fn query(network: &BayesianNetwork, target: &str, evidence: &Evidence) -> RiskResult<Posterior> {
    let variable = network
        .variable(target)
        .ok_or_else(|| RiskError::invalid(format!("unknown variable {target}")))?;
    let factor = network.query(&[target], evidence.as_assignment())?;
    let rows = variable
        .states
        .iter()
        .enumerate()
        .map(|(code, state)| PosteriorRow {
            state: state.clone(),
            code,
            probability: factor.value(&[code]),
        })
        .collect();
    Ok(Posterior {
        variable: target.to_string(),
        rows,
    })
}

/// Most probable outcome state code given `evidence`.
pub fn predict(model: &RiskModel, evidence: &Evidence) -> RiskResult<usize> {
    model.network.map_state(TARGET, evidence.as_assignment())
}

/// MAP outcome for every record, using its nine risk factors as evidence.
pub fn batch_predict(network: &BayesianNetwork, records: &[Record]) -> RiskResult<Vec<usize>> {
    records
        .par_iter()
        .map(|record| network.map_state(TARGET, Evidence::from_record(record).as_assignment()))
        .collect()
}
