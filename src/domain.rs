use std::fmt;
use std::ops::Div;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub const DAZSLE_SUFFIX: &str = "_DAZSLE_PFNano";

const SUBSAMPLE_NOISE: [&str; 2] = ["_TuneCP5", "_LHEweights"];

const MISLABELLED_SUBSAMPLES: [(&str, &str); 2] = [
    ("VBFHHto4B_CV-m2p12", "VBFHHto4B_CV-2p12"),
    ("VBFHHto4B_CV_m2p12", "VBFHHto4B_CV_2p12"),
];

/// Absolute path on the remote store, joined with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/').to_string()
        } else {
            path
        };
        Self(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, component: &str) -> Self {
        let component = component.trim_matches('/');
        if component.is_empty() {
            return self.clone();
        }
        if self.0.is_empty() {
            return Self(component.to_string());
        }
        if self.0.ends_with('/') {
            Self(format!("{}{component}", self.0))
        } else {
            Self(format!("{}/{component}", self.0))
        }
    }

    /// `{redirector}{path}/{file}`, the form stored in the catalog.
    pub fn file_url(&self, redirector: &str, file: &str) -> String {
        format!("{redirector}{}/{file}", self.0)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Div<&str> for &RemotePath {
    type Output = RemotePath;

    fn div(self, component: &str) -> RemotePath {
        self.join(component)
    }
}

impl Div<&String> for &RemotePath {
    type Output = RemotePath;

    fn div(self, component: &String) -> RemotePath {
        self.join(component)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// `{user}/{year}/{sample}/{subsample}/...`
    Old,
    /// `{user}/data_{year}/{subsample}/...` and `{user}/mc_{year}/{subsample}/...`
    New,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Old => write!(f, "old"),
            LayoutMode::New => write!(f, "new"),
        }
    }
}

impl FromStr for LayoutMode {
    type Err = IndexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "old" => Ok(LayoutMode::Old),
            "new" => Ok(LayoutMode::New),
            _ => Err(IndexError::InvalidLayout(value.to_string())),
        }
    }
}

/// Which dataset-version directories contribute to an MC subsample's file list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum McVersionPolicy {
    /// Files from every dataset-version directory.
    #[default]
    All,
    /// Only the last dataset-version directory listed.
    Last,
}

impl fmt::Display for McVersionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McVersionPolicy::All => write!(f, "all"),
            McVersionPolicy::Last => write!(f, "last"),
        }
    }
}

impl FromStr for McVersionPolicy {
    type Err = IndexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(McVersionPolicy::All),
            "last" => Ok(McVersionPolicy::Last),
            _ => Err(IndexError::InvalidMcVersions(value.to_string())),
        }
    }
}

pub fn year_dir_name(year: &str, is_data: bool) -> String {
    if is_data {
        format!("data_{year}")
    } else {
        format!("mc_{year}")
    }
}

/// Drops `_TuneCP5...` and `_LHEweights...` from a subsample directory name.
pub fn canonical_subsample(name: &str) -> &str {
    SUBSAMPLE_NOISE
        .iter()
        .fold(name, |acc, noise| acc.split(noise).next().unwrap_or(acc))
}

/// Returns the corrected key when `name` carries a known MC mislabelling.
pub fn correct_mislabelled(name: &str) -> Option<String> {
    if !MISLABELLED_SUBSAMPLES
        .iter()
        .any(|(wrong, _)| name.contains(wrong))
    {
        return None;
    }
    let corrected = MISLABELLED_SUBSAMPLES
        .iter()
        .fold(name.to_string(), |acc, (wrong, right)| {
            acc.replace(wrong, right)
        });
    Some(corrected)
}

pub fn data_run_key(sample: &str, version_dir: &str) -> String {
    format!("{sample}_{}", version_dir.replace(DAZSLE_SUFFIX, ""))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn join_with_div() {
        let base = RemotePath::new("/store/user/lpcdihiggsboost/");
        let path = &(&base / "alice") / "mc_2022";
        assert_eq!(path.as_str(), "/store/user/lpcdihiggsboost/alice/mc_2022");
    }

    #[test]
    fn file_url_layout() {
        let path = RemotePath::new("/store/user/x/0000");
        assert_eq!(
            path.file_url("root://cmseos.fnal.gov/", "a.root"),
            "root://cmseos.fnal.gov//store/user/x/0000/a.root"
        );
    }

    #[test]
    fn strip_noise_from_subsample() {
        assert_eq!(
            canonical_subsample("TTto4Q_TuneCP5_13p6TeV_powheg-pythia8"),
            "TTto4Q"
        );
        assert_eq!(
            canonical_subsample("GluGlutoHHto4B_kl-1p00_kt-1p00_c2-0p00_LHEweights_TuneCP5"),
            "GluGlutoHHto4B_kl-1p00_kt-1p00_c2-0p00"
        );
        assert_eq!(canonical_subsample("JetMET_Run2022C"), "JetMET_Run2022C");
    }

    #[test]
    fn mislabelled_vbf_is_corrected() {
        assert_eq!(
            correct_mislabelled("VBFHHto4B_CV-m2p12_C2V-3p87_C3-m5p96").as_deref(),
            Some("VBFHHto4B_CV-2p12_C2V-3p87_C3-m5p96")
        );
        assert_eq!(
            correct_mislabelled("VBFHHto4B_CV_m2p12_C2V_3p87").as_deref(),
            Some("VBFHHto4B_CV_2p12_C2V_3p87")
        );
        assert_eq!(correct_mislabelled("VBFHHto4B_CV_1_C2V_1_C3_1"), None);
    }

    #[test]
    fn data_key_strips_dazsle() {
        assert_eq!(
            data_run_key("JetMET", "JetMET0_Run2023C-v1_DAZSLE_PFNano"),
            "JetMET_JetMET0_Run2023C-v1"
        );
    }

    #[test]
    fn parse_modes() {
        assert_eq!("NEW".parse::<LayoutMode>().unwrap(), LayoutMode::New);
        assert_eq!("last".parse::<McVersionPolicy>().unwrap(), McVersionPolicy::Last);
        assert_matches!(
            "sideways".parse::<LayoutMode>(),
            Err(IndexError::InvalidLayout(_))
        );
    }
}
