//! Filesystem repository for trained model artefacts (JSON).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::common::config::AppCfg;
use crate::common::error::{RiskError, RiskResult};

use super::domain::{ModelRepo, RiskModel, ARTEFACT_VERSION};

/// Persist a single model artefact at a fixed path.
pub struct FsModelRepo {
    path: PathBuf,
}

impl FsModelRepo {
    /// Artefact at `cfg.model_path`, resolved under `cfg.data_root` when relative.
    pub fn new(cfg: &AppCfg) -> Self {
        let path = if cfg.model_path.is_absolute() {
            cfg.model_path.clone()
        } else {
            cfg.data_root.join(&cfg.model_path)
        };
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "model.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ModelRepo for FsModelRepo {
    fn put_model(&self, model: &RiskModel) -> RiskResult<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, model)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(self.path.clone())
    }

    fn get_model(&self) -> RiskResult<RiskModel> {
        let file = File::open(&self.path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                RiskError::model_missing(format!("no artefact at {}", self.path.display()))
            }
            _ => RiskError::Io(err),
        })?;
        let model: RiskModel = serde_json::from_reader(BufReader::new(file))?;
        if model.format_version != ARTEFACT_VERSION {
            return Err(RiskError::model_missing(format!(
                "artefact format {} is not supported (expected {ARTEFACT_VERSION})",
                model.format_version
            )));
        }
        Ok(model)
    }
}
