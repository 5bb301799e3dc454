//! Domain definitions for inference requests and posterior tables.

use serde::{Deserialize, Serialize};

use crate::common::error::{RiskError, RiskResult};
use crate::data::domain::{self, Record};
use crate::data::encoding;
use crate::network::Assignment;

/// Risk-factor labels as submitted by the form. Missing fields are left unobserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientForm {
    #[serde(rename = "Age", default)]
    pub age: Option<String>,
    #[serde(rename = "Sexe", default)]
    pub sex: Option<String>,
    #[serde(rename = "Tabagisme", default)]
    pub smoking: Option<String>,
    #[serde(rename = "Hypertension", default)]
    pub hypertension: Option<String>,
    #[serde(rename = "Cholesterol_eleve", default)]
    pub high_cholesterol: Option<String>,
    #[serde(rename = "Antecedents_familiaux", default)]
    pub family_history: Option<String>,
    #[serde(rename = "Activite_physique", default)]
    pub physical_activity: Option<String>,
    #[serde(rename = "Diabete", default)]
    pub diabetes: Option<String>,
    #[serde(rename = "Stress_chronique", default)]
    pub chronic_stress: Option<String>,
}

impl PatientForm {
    /// `(column, label)` pairs in schema order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 9] {
        [
            ("Age", self.age.as_deref()),
            ("Sexe", self.sex.as_deref()),
            ("Tabagisme", self.smoking.as_deref()),
            ("Hypertension", self.hypertension.as_deref()),
            ("Cholesterol_eleve", self.high_cholesterol.as_deref()),
            ("Antecedents_familiaux", self.family_history.as_deref()),
            ("Activite_physique", self.physical_activity.as_deref()),
            ("Diabete", self.diabetes.as_deref()),
            ("Stress_chronique", self.chronic_stress.as_deref()),
        ]
    }

    /// Submitted label for a column, if any.
    pub fn label(&self, column: &str) -> Option<&str> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, label)| label)
    }
}

/// Encoded observations keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evidence(Assignment);

impl Evidence {
    /// Encode every filled-in form field. Empty strings count as unobserved.
    pub fn from_form(form: &PatientForm) -> RiskResult<Self> {
        Self::from_labels(
            form.fields()
                .into_iter()
                .filter_map(|(name, label)| label.filter(|l| !l.trim().is_empty()).map(|l| (name, l))),
        )
    }

    /// Encode `(column, label)` pairs through the shared encoding map.
    pub fn from_labels<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> RiskResult<Self> {
        let mut out = Assignment::new();
        for (name, label) in pairs {
            let (_, spec) = domain::column(name)
                .ok_or_else(|| RiskError::invalid(format!("unknown column {name}")))?;
            if name == domain::TARGET {
                return Err(RiskError::invalid("the outcome cannot be used as evidence"));
            }
            out.insert(name.to_string(), encoding::encode(spec, label)?);
        }
        Ok(Self(out))
    }

    /// All nine risk factors of an encoded record.
    pub fn from_record(record: &Record) -> Self {
        Self(
            domain::risk_factors()
                .iter()
                .zip(record.0)
                .map(|(spec, code)| (spec.name.to_string(), code))
                .collect(),
        )
    }

    pub fn as_assignment(&self) -> &Assignment {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One line of a posterior table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosteriorRow {
    pub state: String,
    pub code: usize,
    pub probability: f64,
}

/// Posterior distribution of a single variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub variable: String,
    pub rows: Vec<PosteriorRow>,
}

impl Posterior {
    /// Copy with probabilities rounded to `decimals` places, for display.
    pub fn rounded(&self, decimals: i32) -> Posterior {
        let scale = 10f64.powi(decimals);
        Posterior {
            variable: self.variable.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| PosteriorRow {
                    probability: (row.probability * scale).round() / scale,
                    ..row.clone()
                })
                .collect(),
        }
    }

    pub fn probability_of(&self, state: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.state == state).map(|r| r.probability)
    }

    /// Most probable row; ties go to the lowest code.
    pub fn most_likely(&self) -> Option<&PosteriorRow> {
        self.rows.iter().fold(None, |best: Option<&PosteriorRow>, row| match best {
            Some(b) if b.probability >= row.probability => Some(b),
            _ => Some(row),
        })
    }
}
