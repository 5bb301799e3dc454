//! Categorical encoding shared by training data and form evidence.

use super::domain::ColumnSpec;
use crate::common::error::{RiskError, RiskResult};

/// Label to code map applied to every column.
pub const ENCODING: &[(&str, usize)] = &[
    ("Oui", 1),
    ("Non", 0),
    ("Homme", 1),
    ("Femme", 0),
    ("Jeune", 0),
    ("Moyen", 1),
    ("Adulte", 2),
];

/// Code for a label, if the label is known.
pub fn encode_label(label: &str) -> Option<usize> {
    ENCODING
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, code)| *code)
}

/// Encode a label for `column`, checking the code is one of the column's states.
pub fn encode(column: &ColumnSpec, label: &str) -> RiskResult<usize> {
    let label = label.trim();
    let code = encode_label(label)
        .filter(|code| column.states.get(*code) == Some(&label))
        .ok_or_else(|| {
            RiskError::invalid(format!("unknown value {label:?} for {}", column.name))
        })?;
    Ok(code)
}

/// Encode a CSV cell: either a known label or an in-range integer code.
pub fn encode_cell(column: &ColumnSpec, raw: &str) -> RiskResult<usize> {
    let raw = raw.trim();
    if let Ok(code) = raw.parse::<usize>() {
        if code < column.states.len() {
            return Ok(code);
        }
        return Err(RiskError::invalid(format!(
            "code {code} out of range for {}",
            column.name
        )));
    }
    encode(column, raw)
}

/// Label for a code, if in range.
pub fn decode(column: &ColumnSpec, code: usize) -> Option<&'static str> {
    column.states.get(code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::SCHEMA;

    #[test]
    fn every_form_option_is_encodable() {
        for col in &SCHEMA {
            for option in col.options {
                let code = encode(col, option).unwrap();
                assert_eq!(decode(col, code), Some(*option));
            }
        }
    }

    #[test]
    fn state_labels_encode_to_their_index() {
        for col in &SCHEMA {
            for (idx, state) in col.states.iter().enumerate() {
                assert_eq!(encode_label(state), Some(idx), "{}:{state}", col.name);
            }
        }
    }

    #[test]
    fn cells_accept_labels_and_codes() {
        let age = &SCHEMA[0];
        assert_eq!(encode_cell(age, "Adulte").unwrap(), 2);
        assert_eq!(encode_cell(age, " 1 ").unwrap(), 1);
        assert!(encode_cell(age, "3").is_err());
        assert!(encode_cell(age, "Vieux").is_err());
    }

    #[test]
    fn labels_are_checked_against_the_column() {
        let sexe = &SCHEMA[1];
        assert_eq!(encode(sexe, "Homme").unwrap(), 1);
        // "Oui" encodes to 1 but is not a state of Sexe.
        assert!(encode(sexe, "Oui").is_err());
    }
}
