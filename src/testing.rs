//! Deterministic synthetic patients shared by unit tests.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::ids::Fingerprint;
use crate::data::domain::{Dataset, Record, SCHEMA};

/// Risk-factor codes (schema order) and the usual outcome for that profile.
const PROFILES: [([usize; 9], usize); 6] = [
    ([0, 0, 0, 0, 0, 0, 1, 0, 0], 0),
    ([0, 1, 1, 0, 0, 0, 1, 0, 1], 0),
    ([1, 0, 0, 1, 0, 1, 0, 0, 0], 0),
    ([1, 1, 1, 1, 1, 0, 0, 0, 1], 1),
    ([2, 1, 1, 1, 1, 1, 0, 1, 1], 1),
    ([2, 0, 0, 1, 1, 1, 0, 1, 0], 1),
];

/// `n` records drawn from a few profiles, with 5% of outcomes flipped.
pub fn synthetic_records(n: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|_| {
            let (factors, outcome) = PROFILES[rng.gen_range(0..PROFILES.len())];
            let outcome = if rng.gen_bool(0.05) { 1 - outcome } else { outcome };
            let mut codes = [0usize; 10];
            codes[..9].copy_from_slice(&factors);
            codes[9] = outcome;
            Record(codes)
        })
        .collect()
}

pub fn synthetic_dataset(n: usize) -> Dataset {
    let records = synthetic_records(n);
    let mut fingerprint = Fingerprint::new();
    for record in &records {
        let bytes: Vec<u8> = record.0.iter().map(|c| *c as u8).collect();
        fingerprint.update(&bytes);
    }
    Dataset {
        source: PathBuf::from("synthetic"),
        records,
        fingerprint: fingerprint.finish_hex(),
    }
}

/// Write `n` synthetic records as a labelled CSV under `dir`.
pub fn write_csv(dir: &Path, n: usize) -> PathBuf {
    let mut out = SCHEMA.iter().map(|c| c.name).collect::<Vec<_>>().join(",");
    out.push('\n');
    for record in synthetic_records(n) {
        let labels: Vec<&str> = SCHEMA
            .iter()
            .zip(record.0)
            .map(|(col, code)| col.states[code])
            .collect();
        let _ = writeln!(out, "{}", labels.join(","));
    }
    let path = dir.join("dataset_risque_cardiaque.csv");
    fs::write(&path, out).expect("write synthetic csv");
    path
}
