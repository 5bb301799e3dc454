//! Core dataset definitions: the fixed column schema and encoded records.

use std::path::PathBuf;

use crate::network::Variable;

/// Outcome variable predicted by the model.
pub const TARGET: &str = "Risque_cardiaque";

/// Number of columns in the schema (nine risk factors plus the outcome).
pub const N_COLUMNS: usize = 10;

/// One categorical column of the dataset and its form presentation.
#[derive(Copy, Clone, Debug)]
pub struct ColumnSpec {
    /// CSV header name, also the network node name.
    pub name: &'static str,
    /// State labels indexed by code.
    pub states: &'static [&'static str],
    /// Question shown on the form.
    pub prompt: &'static str,
    /// Order in which the form offers the labels.
    pub options: &'static [&'static str],
}

const YES_NO: &[&str] = &["Non", "Oui"];
const OUI_NON: &[&str] = &["Oui", "Non"];

/// The fixed schema, risk factors first and the outcome last.
pub static SCHEMA: [ColumnSpec; N_COLUMNS] = [
    ColumnSpec {
        name: "Age",
        states: &["Jeune", "Moyen", "Adulte"],
        prompt: "Tranche d'âge",
        options: &["Jeune", "Moyen", "Adulte"],
    },
    ColumnSpec {
        name: "Sexe",
        states: &["Femme", "Homme"],
        prompt: "Sexe",
        options: &["Homme", "Femme"],
    },
    ColumnSpec {
        name: "Tabagisme",
        states: YES_NO,
        prompt: "Fumeur ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Hypertension",
        states: YES_NO,
        prompt: "Hypertension ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Cholesterol_eleve",
        states: YES_NO,
        prompt: "Cholestérol élevé ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Antecedents_familiaux",
        states: YES_NO,
        prompt: "Antécédents familiaux ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Activite_physique",
        states: YES_NO,
        prompt: "Activité physique régulière ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Diabete",
        states: YES_NO,
        prompt: "Diabète ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: "Stress_chronique",
        states: YES_NO,
        prompt: "Stress chronique ?",
        options: OUI_NON,
    },
    ColumnSpec {
        name: TARGET,
        states: YES_NO,
        prompt: "Risque cardiaque",
        options: OUI_NON,
    },
];

/// Risk-factor columns (everything except the outcome).
pub fn risk_factors() -> &'static [ColumnSpec] {
    &SCHEMA[..N_COLUMNS - 1]
}

/// Position of the outcome column in a [`Record`].
pub const TARGET_INDEX: usize = N_COLUMNS - 1;

pub fn column(name: &str) -> Option<(usize, &'static ColumnSpec)> {
    SCHEMA.iter().enumerate().find(|(_, c)| c.name == name)
}

/// Schema columns as network variables, in record order.
pub fn schema_variables() -> Vec<Variable> {
    SCHEMA
        .iter()
        .map(|c| Variable::new(c.name, c.states.iter().copied()))
        .collect()
}

/// One encoded row; codes follow [`SCHEMA`] order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record(pub [usize; N_COLUMNS]);

impl Record {
    pub fn outcome(&self) -> usize {
        self.0[TARGET_INDEX]
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        column(name).map(|(idx, _)| self.0[idx])
    }
}

impl AsRef<[usize]> for Record {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

/// Loaded, fully encoded dataset.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub source: PathBuf,
    pub records: Vec<Record>,
    /// Hex fingerprint of the encoded content, used as a cache key and for lineage.
    pub fingerprint: String,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of a train/test split.
#[derive(Clone, Debug)]
pub struct Split {
    pub train: Vec<Record>,
    pub test: Vec<Record>,
}
