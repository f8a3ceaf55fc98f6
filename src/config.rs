use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{LayoutMode, McVersionPolicy};
use crate::error::IndexError;

pub const DEFAULT_CONFIG_FILE: &str = "nano-index.json";
pub const DEFAULT_REDIRECTOR: &str = "root://cmseos.fnal.gov/";
pub const DEFAULT_BASE_DIR: &str = "/store/user/lpcdihiggsboost/NanoAOD_v12_ParT";
pub const DEFAULT_SUFFIX: &str = ".root";
pub const DEFAULT_OUT_NAME: &str = "index";

pub const YEARS: [&str; 4] = ["2022", "2022EE", "2023", "2023BPix"];

pub const DATA_SAMPLES: [&str; 8] = [
    "JetMET",
    "Muon",
    "EGamma",
    "Tau",
    "BTagMu",
    "MuonEG",
    "ParkingVBF",
    "ParkingSingleMuon",
];

/// Optional `nano-index.json`; every field falls back to the built-in default.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub redirector: Option<String>,
    #[serde(default)]
    pub base_dir: Option<String>,
    #[serde(default)]
    pub years: Option<Vec<String>>,
    #[serde(default)]
    pub data_samples: Option<Vec<String>>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub mc_versions: Option<String>,
    #[serde(default)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub redirector: String,
    pub base_dir: String,
    pub years: Vec<String>,
    pub data_samples: Vec<String>,
    pub suffix: String,
    pub layout: Option<LayoutMode>,
    pub mc_versions: McVersionPolicy,
    pub jobs: usize,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `nano-index.json` when present, or the defaults.
    ///
    /// An explicitly given path must exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IndexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IndexError::ConfigRead(config_path.display().to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IndexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IndexError> {
        let layout = config
            .layout
            .map(|value| value.parse::<LayoutMode>())
            .transpose()?;
        let mc_versions = config
            .mc_versions
            .map(|value| value.parse::<McVersionPolicy>())
            .transpose()?
            .unwrap_or_default();

        Ok(ResolvedConfig {
            redirector: config
                .redirector
                .unwrap_or_else(|| DEFAULT_REDIRECTOR.to_string()),
            base_dir: config
                .base_dir
                .unwrap_or_else(|| DEFAULT_BASE_DIR.to_string()),
            years: config.years.unwrap_or_else(default_years),
            data_samples: config.data_samples.unwrap_or_else(default_data_samples),
            suffix: config.suffix.unwrap_or_else(|| DEFAULT_SUFFIX.to_string()),
            layout,
            mc_versions,
            jobs: config.jobs.unwrap_or(1).max(1),
        })
    }
}

pub fn default_years() -> Vec<String> {
    YEARS.iter().map(|year| year.to_string()).collect()
}

pub fn default_data_samples() -> Vec<String> {
    DATA_SAMPLES.iter().map(|sample| sample.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.redirector, DEFAULT_REDIRECTOR);
        assert_eq!(resolved.years, default_years());
        assert_eq!(resolved.suffix, ".root");
        assert_eq!(resolved.layout, None);
        assert_eq!(resolved.mc_versions, McVersionPolicy::All);
        assert_eq!(resolved.jobs, 1);
    }
}
