//! Filesystem-backed CSV reader for the risk dataset.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::common::config::AppCfg;
use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::Fingerprint;

use super::domain::{Dataset, Record, N_COLUMNS, SCHEMA};
use super::encoding;

/// Repository rooted at `cfg.data_root`.
pub struct FsDataRepo {
    root: PathBuf,
}

impl FsDataRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            root: cfg.data_root.clone(),
        }
    }

    /// Resolve a dataset name against the root. Absolute paths are used as-is.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.root.join(name)
        }
    }
}

/// Stream a CSV file and encode every row against [`SCHEMA`].
///
/// Header names must include every schema column; extra columns are ignored
/// and column order is free.
pub fn read_csv(path: &Path) -> RiskResult<Dataset> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mut positions = [0usize; N_COLUMNS];
    for (slot, spec) in positions.iter_mut().zip(SCHEMA.iter()) {
        *slot = headers
            .iter()
            .position(|h| h == spec.name)
            .ok_or_else(|| RiskError::invalid(format!("missing column {}", spec.name)))?;
    }

    let mut fingerprint = Fingerprint::new();
    let mut records = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row?;
        let mut codes = [0usize; N_COLUMNS];
        for ((code, spec), pos) in codes.iter_mut().zip(SCHEMA.iter()).zip(positions) {
            let cell = row.get(pos).unwrap_or_default();
            // Row numbers are 1-based and count the header line.
            *code = encoding::encode_cell(spec, cell).map_err(|err| {
                RiskError::invalid(format!("line {}: {err}", row_idx + 2))
            })?;
        }
        let bytes: Vec<u8> = codes.iter().map(|c| *c as u8).collect();
        fingerprint.update(&bytes);
        records.push(Record(codes));
    }

    Ok(Dataset {
        source: path.to_path_buf(),
        records,
        fingerprint: fingerprint.finish_hex(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    const HEADER: &str = "Age,Sexe,Tabagisme,Hypertension,Cholesterol_eleve,Antecedents_familiaux,Activite_physique,Diabete,Stress_chronique,Risque_cardiaque";

    #[test]
    fn reads_labels_and_codes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            format!("{HEADER}\nAdulte,Homme,Oui,Non,Oui,Non,Oui,Non,Oui,Oui\n0,0,0,1,0,1,0,1,0,0\n"),
        )
        .unwrap();

        let dataset = read_csv(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].0, [2, 1, 1, 0, 1, 0, 1, 0, 1, 1]);
        assert_eq!(dataset.records[1].outcome(), 0);
        assert_eq!(dataset.fingerprint.len(), 64);
    }

    #[test]
    fn column_order_is_free_and_extras_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "id,Risque_cardiaque,Stress_chronique,Diabete,Activite_physique,Antecedents_familiaux,Cholesterol_eleve,Hypertension,Tabagisme,Sexe,Age\n\
             7,Oui,Non,Non,Non,Non,Non,Non,Non,Femme,Moyen\n",
        )
        .unwrap();
        let dataset = read_csv(&path).unwrap();
        assert_eq!(dataset.records[0].get("Age"), Some(1));
        assert_eq!(dataset.records[0].outcome(), 1);
    }

    #[test]
    fn reports_missing_columns_and_bad_cells() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        fs::write(&missing, "Age,Sexe\nJeune,Homme\n").unwrap();
        let err = read_csv(&missing).unwrap_err();
        assert!(err.to_string().contains("missing column Tabagisme"));

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, format!("{HEADER}\nAdulte,Homme,Peut-etre,Non,Oui,Non,Oui,Non,Oui,Oui\n")).unwrap();
        let err = read_csv(&bad).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn repo_resolves_relative_names_under_root() {
        let cfg = AppCfg {
            data_root: PathBuf::from("/srv/data"),
            ..AppCfg::default()
        };
        let repo = FsDataRepo::new(&cfg);
        assert_eq!(repo.resolve("a.csv"), PathBuf::from("/srv/data/a.csv"));
        assert_eq!(repo.resolve("/tmp/b.csv"), PathBuf::from("/tmp/b.csv"));
    }
}
