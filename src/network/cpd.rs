//! Variables, tabular CPDs and count-based parameter estimation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::factor::Factor;
use crate::common::error::{RiskError, RiskResult};

const ROW_TOLERANCE: f64 = 1e-6;

/// Equivalent sample size used when none is given (bnlearn's BDeu default).
pub const DEFAULT_ESS: f64 = 1000.0;

/// Discrete variable with labelled states. State codes are indices into `states`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub states: Vec<String>,
}

impl Variable {
    pub fn new<S: Into<String>>(name: impl Into<String>, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s == label)
    }
}

/// Parameter estimation strategy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Relative frequencies. Unseen parent configurations get a uniform row.
    MaximumLikelihood,
    /// Posterior mean under a BDeu Dirichlet prior.
    Bayes { equivalent_sample_size: f64 },
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::Bayes {
            equivalent_sample_size: DEFAULT_ESS,
        }
    }
}

impl Estimator {
    /// Parse `mle` / `bayes` (with aliases); `ess` only applies to the Bayes estimator.
    pub fn parse(raw: &str, ess: Option<f64>) -> RiskResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mle" | "ml" | "maximum_likelihood" => Ok(Estimator::MaximumLikelihood),
            "bayes" | "bdeu" => Self::bayes(ess.unwrap_or(DEFAULT_ESS)),
            other => Err(RiskError::invalid(format!("unknown estimator {other}"))),
        }
    }

    /// BDeu estimator; the equivalent sample size must be finite and positive.
    pub fn bayes(equivalent_sample_size: f64) -> RiskResult<Self> {
        check_ess(equivalent_sample_size)?;
        Ok(Estimator::Bayes {
            equivalent_sample_size,
        })
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimator::MaximumLikelihood => write!(f, "mle"),
            Estimator::Bayes {
                equivalent_sample_size,
            } => write!(f, "bayes(ess={equivalent_sample_size})"),
        }
    }
}

/// Conditional distribution of `variable` given `parents`.
///
/// `values` holds one row per parent configuration (row-major over parents,
/// last parent fastest); each row is a distribution over the variable's states.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabularCpd {
    variable: String,
    cardinality: usize,
    parents: Vec<String>,
    parent_cards: Vec<usize>,
    values: Vec<Vec<f64>>,
}

impl TabularCpd {
    pub fn new(
        variable: impl Into<String>,
        cardinality: usize,
        parents: Vec<String>,
        parent_cards: Vec<usize>,
        values: Vec<Vec<f64>>,
    ) -> RiskResult<Self> {
        let cpd = Self {
            variable: variable.into(),
            cardinality,
            parents,
            parent_cards,
            values,
        };
        cpd.validate()?;
        Ok(cpd)
    }

    /// Check shape and that every row is a distribution.
    pub fn validate(&self) -> RiskResult<()> {
        if self.parents.len() != self.parent_cards.len() {
            return Err(RiskError::invalid(format!(
                "cpd {}: parents and cardinalities differ in length",
                self.variable
            )));
        }
        let configs: usize = self.parent_cards.iter().product();
        if self.values.len() != configs {
            return Err(RiskError::invalid(format!(
                "cpd {}: expected {configs} rows, got {}",
                self.variable,
                self.values.len()
            )));
        }
        for (idx, row) in self.values.iter().enumerate() {
            if row.len() != self.cardinality {
                return Err(RiskError::invalid(format!(
                    "cpd {} row {idx}: expected {} entries",
                    self.variable, self.cardinality
                )));
            }
            let sum: f64 = row.iter().sum();
            if row.iter().any(|p| !p.is_finite() || *p < 0.0) || (sum - 1.0).abs() > ROW_TOLERANCE {
                return Err(RiskError::invalid(format!(
                    "cpd {} row {idx} is not a distribution (sum {sum})",
                    self.variable
                )));
            }
        }
        Ok(())
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Row index for a parent configuration given in `parents` order.
    pub fn config_index(&self, parent_states: &[usize]) -> usize {
        parent_states
            .iter()
            .zip(&self.parent_cards)
            .fold(0, |acc, (state, card)| acc * card + state)
    }

    /// Distribution of the variable for one parent configuration.
    pub fn row(&self, parent_states: &[usize]) -> &[f64] {
        &self.values[self.config_index(parent_states)]
    }

    /// Factor over `parents ++ [variable]`.
    pub fn to_factor(&self) -> RiskResult<Factor> {
        let mut vars = self.parents.clone();
        vars.push(self.variable.clone());
        let mut cards = self.parent_cards.clone();
        cards.push(self.cardinality);
        let values = self.values.iter().flatten().copied().collect();
        Factor::new(vars, cards, values)
    }

    /// Estimate a CPD from encoded rows.
    ///
    /// `column` is the variable's column in each row and `parent_columns` the
    /// parents' columns, aligned with `parent_cards`.
    pub fn estimate<R: AsRef<[usize]>>(
        variable: &Variable,
        column: usize,
        parents: &[(&Variable, usize)],
        rows: &[R],
        estimator: Estimator,
    ) -> RiskResult<Self> {
        let card = variable.cardinality();
        let parent_cards: Vec<usize> = parents.iter().map(|(v, _)| v.cardinality()).collect();
        let configs: usize = parent_cards.iter().product();
        let mut counts = vec![vec![0.0_f64; card]; configs];

        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let state = checked_state(row, column, variable, row_idx)?;
            let mut config = 0;
            for ((parent, parent_column), parent_card) in parents.iter().zip(&parent_cards) {
                let parent_state = checked_state(row, *parent_column, parent, row_idx)?;
                config = config * parent_card + parent_state;
            }
            counts[config][state] += 1.0;
        }

        let values = counts
            .into_iter()
            .map(|row| normalise_counts(row, configs, estimator))
            .collect();

        Self::new(
            variable.name.clone(),
            card,
            parents.iter().map(|(v, _)| v.name.clone()).collect(),
            parent_cards,
            values,
        )
    }
}

/// Reject an equivalent sample size that is not finite and strictly positive.
pub fn check_ess(ess: f64) -> RiskResult<f64> {
    if ess.is_finite() && ess > 0.0 {
        Ok(ess)
    } else {
        Err(RiskError::invalid(format!(
            "equivalent sample size must be positive, got {ess}"
        )))
    }
}

fn checked_state(row: &[usize], column: usize, variable: &Variable, row_idx: usize) -> RiskResult<usize> {
    let state = *row.get(column).ok_or_else(|| {
        RiskError::invalid(format!("row {row_idx} has no column {column} for {}", variable.name))
    })?;
    if state >= variable.cardinality() {
        return Err(RiskError::invalid(format!(
            "row {row_idx}: state {state} out of range for {}",
            variable.name
        )));
    }
    Ok(state)
}

fn normalise_counts(counts: Vec<f64>, configs: usize, estimator: Estimator) -> Vec<f64> {
    let card = counts.len();
    let pseudo = match estimator {
        Estimator::MaximumLikelihood => 0.0,
        Estimator::Bayes {
            equivalent_sample_size,
        } => equivalent_sample_size / (card * configs) as f64,
    };
    let total: f64 = counts.iter().sum::<f64>() + pseudo * card as f64;
    if total <= 0.0 {
        return vec![1.0 / card as f64; card];
    }
    counts.into_iter().map(|c| (c + pseudo) / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes_no(name: &str) -> Variable {
        Variable::new(name, ["Non", "Oui"])
    }

    #[test]
    fn mle_matches_frequencies() {
        let x = yes_no("X");
        let y = yes_no("Y");
        // (X, Y) rows: X=0 -> Y always 0; X=1 -> Y=1 three times out of four.
        let rows = vec![
            vec![0, 0],
            vec![0, 0],
            vec![1, 1],
            vec![1, 1],
            vec![1, 1],
            vec![1, 0],
        ];
        let cpd = TabularCpd::estimate(&y, 1, &[(&x, 0)], &rows, Estimator::MaximumLikelihood).unwrap();
        assert_eq!(cpd.row(&[0]), &[1.0, 0.0]);
        assert_eq!(cpd.row(&[1]), &[0.25, 0.75]);
    }

    #[test]
    fn mle_unseen_configuration_is_uniform() {
        let a = Variable::new("A", ["Jeune", "Moyen", "Adulte"]);
        let y = yes_no("Y");
        let rows = vec![vec![0, 1], vec![1, 0]];
        let cpd = TabularCpd::estimate(&y, 1, &[(&a, 0)], &rows, Estimator::MaximumLikelihood).unwrap();
        assert_eq!(cpd.row(&[2]), &[0.5, 0.5]);
    }

    #[test]
    fn bdeu_smoothing_matches_closed_form() {
        let x = yes_no("X");
        let y = yes_no("Y");
        let rows = vec![vec![1, 1], vec![1, 1], vec![1, 0]];
        let est = Estimator::Bayes {
            equivalent_sample_size: 4.0,
        };
        let cpd = TabularCpd::estimate(&y, 1, &[(&x, 0)], &rows, est).unwrap();
        // pseudo = 4 / (2 * 2) = 1 per cell.
        let row = cpd.row(&[1]);
        assert!((row[0] - 2.0 / 5.0).abs() < 1e-12);
        assert!((row[1] - 3.0 / 5.0).abs() < 1e-12);
        assert_eq!(cpd.row(&[0]), &[0.5, 0.5]);
        for row in cpd.rows() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn out_of_range_state_is_rejected() {
        let y = yes_no("Y");
        let rows = vec![vec![2]];
        let err = TabularCpd::estimate(&y, 0, &[], &rows, Estimator::MaximumLikelihood).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn rejects_rows_that_do_not_sum_to_one() {
        let err = TabularCpd::new("Y", 2, vec![], vec![], vec![vec![0.3, 0.3]]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn factor_layout_follows_parent_configurations() {
        let cpd = TabularCpd::new(
            "Y",
            2,
            vec!["A".into(), "B".into()],
            vec![2, 2],
            vec![vec![0.9, 0.1], vec![0.8, 0.2], vec![0.7, 0.3], vec![0.6, 0.4]],
        )
        .unwrap();
        let factor = cpd.to_factor().unwrap();
        assert_eq!(factor.variables(), ["A", "B", "Y"]);
        assert_eq!(factor.value(&[1, 0, 1]), 0.3);
        assert_eq!(cpd.row(&[0, 1]), &[0.8, 0.2]);
    }

    #[test]
    fn parses_estimators() {
        assert_eq!(Estimator::parse("MLE", None).unwrap(), Estimator::MaximumLikelihood);
        assert_eq!(
            Estimator::parse("bdeu", Some(3.0)).unwrap(),
            Estimator::Bayes { equivalent_sample_size: 3.0 }
        );
        assert!(Estimator::parse("em", None).is_err());
        assert_eq!(Estimator::parse("bayes", None).unwrap(), Estimator::default());
    }

    #[test]
    fn rejects_non_positive_equivalent_sample_size() {
        for ess in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let err = Estimator::parse("bayes", Some(ess)).unwrap_err();
            assert!(matches!(err, RiskError::InvalidInput(_)), "ess {ess}");
            assert!(Estimator::bayes(ess).is_err());
        }
        // MLE ignores the prior strength entirely.
        assert_eq!(
            Estimator::parse("mle", Some(-1.0)).unwrap(),
            Estimator::MaximumLikelihood
        );
    }
}
