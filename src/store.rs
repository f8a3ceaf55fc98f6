use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::catalog::{Catalog, YearEntry};
use crate::error::IndexError;

/// Per-year catalog files named `{out_name}_{year}.json`.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    out_name: Utf8PathBuf,
}

impl CatalogStore {
    pub fn new(out_name: impl Into<Utf8PathBuf>) -> Self {
        Self {
            out_name: out_name.into(),
        }
    }

    pub fn year_path(&self, year: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}_{year}.json", self.out_name))
    }

    /// Reads the catalog file of every year that has one; missing years are skipped.
    pub fn load(&self, years: &[String]) -> Result<Catalog, IndexError> {
        let mut catalog = Catalog::new();
        for year in years {
            if let Some(entry) = self.load_year(year)? {
                catalog.insert_year(year.clone(), entry);
            }
        }
        Ok(catalog)
    }

    pub fn load_year(&self, year: &str) -> Result<Option<YearEntry>, IndexError> {
        let path = self.year_path(year);
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no existing catalog at {path}");
                return Ok(None);
            }
            Err(err) => return Err(IndexError::Filesystem(format!("read {path}: {err}"))),
        };
        let entry = serde_json::from_str(&content).map_err(|err| IndexError::CatalogParse {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        info!("loaded {path}");
        Ok(Some(entry))
    }

    /// Writes one file per year in `catalog`, returning the written paths.
    pub fn save(&self, catalog: &Catalog) -> Result<Vec<Utf8PathBuf>, IndexError> {
        let mut written = Vec::new();
        for (year, entry) in catalog.years() {
            let path = self.year_path(year);
            write_json_atomic(&path, entry)?;
            info!("wrote {path}");
            written.push(path);
        }
        Ok(written)
    }
}

/// Pretty JSON with four-space indentation.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

pub fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), IndexError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| IndexError::Filesystem(err.to_string()))?;
    let content = to_json_pretty(value).map_err(|err| IndexError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("nano-index")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| IndexError::Filesystem(err.to_string()))?;
    temp.write_all(&content)
        .map_err(|err| IndexError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| IndexError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_path_layout() {
        let store = CatalogStore::new("data/index");
        assert_eq!(store.year_path("2022EE"), "data/index_2022EE.json");
    }

    #[test]
    fn four_space_indent() {
        let mut entry = YearEntry::new();
        entry.entry("QCD".to_string()).or_default().insert(
            "QCD-4Jets_HT-200to400".to_string(),
            vec!["root://r//a.root".to_string()],
        );
        let json = String::from_utf8(to_json_pretty(&entry).unwrap()).unwrap();
        assert!(json.starts_with("{\n    \"QCD\": {\n        \"QCD-4Jets_HT-200to400\""));
    }
}
