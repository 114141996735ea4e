// Report configuration, built once in `main` and passed down explicitly.
//
// Every field has a default so a partial JSON file (or none at all) is
// enough to run.
use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASELINE_METHOD: &str = "MoA&FW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Sqlite,
            path: PathBuf::from("crop_yields.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub store: StoreConfig,
    /// Official historical figure; never a dynamic method column.
    pub baseline_method: String,
    pub sub_columns: Vec<String>,
    pub organisation: String,
    pub contact_line: String,
    pub attribution: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            store: StoreConfig::default(),
            baseline_method: DEFAULT_BASELINE_METHOD.to_string(),
            sub_columns: vec!["Yield".to_string(), "Error".to_string()],
            organisation: "IDEAS - Institute of Data Engineering, Analytics and Science Foundation"
                .to_string(),
            contact_line: "ISI Kolkata | https://www.ideas-tih.org | +91 6289351800".to_string(),
            attribution: "IDEAS-TIH. All rights reserved.".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(s: &str) -> ReportResult<Self> {
        let config: ReportConfig = serde_json::from_str(s).map_err(|e| ReportError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ReportResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ReportError::Config {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> ReportResult<()> {
        if self.baseline_method.trim().is_empty() {
            return Err(ReportError::Config {
                reason: "baseline_method must not be empty".to_string(),
            });
        }
        if self.sub_columns.is_empty() {
            return Err(ReportError::Config {
                reason: "sub_columns must name at least one column".to_string(),
            });
        }
        Ok(())
    }
}
