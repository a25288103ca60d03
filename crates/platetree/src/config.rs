//! Run configuration: the vocabularies that vary between archive releases.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable vocabularies for one ingestion run.
///
/// Loaded from YAML; every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis CSV kinds, matched as `<kind>.csv` / `<kind>.csv.gz`
    /// filename suffixes in vocabulary order.
    pub analysis_csv_files: Vec<String>,

    /// A listing line containing any of these is skipped without a trace.
    pub noise_markers: Vec<String>,

    /// load_data files containing any of these are split copies and ignored.
    pub load_data_split_markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_csv_files: ["Cells", "Cytoplasm", "Nuclei", "Image", "Experiment"]
                .into_iter()
                .map(String::from)
                .collect(),
            noise_markers: vec!["DS_Store".to_string()],
            load_data_split_markers: vec!["load_data_with_illum_split-".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a YAML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis_csv_files.is_empty() {
            return Err(Error::config("analysis_csv_files cannot be empty"));
        }
        let lists = [
            ("analysis_csv_files", &self.analysis_csv_files),
            ("noise_markers", &self.noise_markers),
            ("load_data_split_markers", &self.load_data_split_markers),
        ];
        for (name, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(Error::config(format!("{name} contains an empty entry")));
            }
        }
        Ok(())
    }

    /// True if the line should be dropped as filesystem noise.
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise_markers.iter().any(|m| line.contains(m.as_str()))
    }

    /// True if the load_data filename is a split copy.
    pub fn is_split_load_data(&self, path: &str) -> bool {
        self.load_data_split_markers
            .iter()
            .any(|m| path.contains(m.as_str()))
    }

    /// The analysis CSV kind the path ends with, if any.
    pub fn analysis_csv_kind(&self, path: &str) -> Option<&str> {
        self.analysis_csv_files.iter().map(String::as_str).find(|kind| {
            CSV_EXTENSIONS
                .iter()
                .any(|ext| path.ends_with(&format!("{kind}.{ext}")))
        })
    }
}

/// Extensions accepted for analysis CSV files and profiles.
pub const CSV_EXTENSIONS: [&str; 2] = ["csv", "csv.gz"];
