use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Subsample key (or data run key) to file URLs.
pub type SampleEntry = BTreeMap<String, Vec<String>>;

/// Sample name to its subsamples.
pub type YearEntry = BTreeMap<String, SampleEntry>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    years: BTreeMap<String, YearEntry>,
}

/// One mutation produced by crawling a branch, applied in order by [`Catalog::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogUpdate {
    /// The crawl reached `sample`; creates it, or resets it under `overwrite_sample`.
    TouchSample { year: String, sample: String },
    /// Stores `files` under `key`, dropping whatever was there.
    Replace {
        year: String,
        sample: String,
        key: String,
        files: Vec<String>,
    },
    /// Appends `files` to `key`, skipping URLs already present.
    Extend {
        year: String,
        sample: String,
        key: String,
        files: Vec<String>,
    },
}

/// Bookkeeping for a single run: which samples were already reset and which
/// keys were written, so duplicates can be told apart from keys loaded from disk.
#[derive(Debug, Default)]
pub struct MergeState {
    reset_samples: HashSet<(String, String)>,
    written_keys: HashSet<(String, String, String)>,
    duplicates: Vec<String>,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that collided within the run, as `year/sample/key`.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn years(&self) -> impl Iterator<Item = (&String, &YearEntry)> {
        self.years.iter()
    }

    pub fn year(&self, year: &str) -> Option<&YearEntry> {
        self.years.get(year)
    }

    pub fn files(&self, year: &str, sample: &str, key: &str) -> Option<&[String]> {
        self.years
            .get(year)
            .and_then(|entry| entry.get(sample))
            .and_then(|sample| sample.get(key))
            .map(Vec::as_slice)
    }

    pub fn ensure_year(&mut self, year: &str) -> &mut YearEntry {
        self.years.entry(year.to_string()).or_default()
    }

    pub fn insert_year(&mut self, year: impl Into<String>, entry: YearEntry) {
        self.years.insert(year.into(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|entry| entry.values())
            .flat_map(|sample| sample.values())
            .map(Vec::len)
            .sum()
    }

    /// Merges one update and returns the number of files it recorded.
    pub fn apply(
        &mut self,
        update: CatalogUpdate,
        state: &mut MergeState,
        overwrite_sample: bool,
    ) -> usize {
        match update {
            CatalogUpdate::TouchSample { year, sample } => {
                let reset_key = (year.clone(), sample.clone());
                let entry = self.ensure_year(&year);
                if !entry.contains_key(&sample) {
                    entry.insert(sample, SampleEntry::new());
                    // Freshly created in this run, nothing to overwrite later.
                    state.reset_samples.insert(reset_key);
                } else if overwrite_sample && state.reset_samples.insert(reset_key) {
                    warn!("Overwriting existing sample {sample} for {year}");
                    entry.insert(sample, SampleEntry::new());
                }
                0
            }
            CatalogUpdate::Replace {
                year,
                sample,
                key,
                files,
            } => {
                let written = (year.clone(), sample.clone(), key.clone());
                let entry = self
                    .ensure_year(&year)
                    .entry(sample.clone())
                    .or_default();
                if state.written_keys.contains(&written) {
                    warn!("Duplicate subsample found! {key} in {sample} for {year}");
                    state.duplicates.push(format!("{year}/{sample}/{key}"));
                } else if entry.contains_key(&key) {
                    debug!("replacing previously stored {key} in {sample} for {year}");
                }
                let recorded = files.len();
                entry.insert(key, files);
                state.written_keys.insert(written);
                recorded
            }
            CatalogUpdate::Extend {
                year,
                sample,
                key,
                files,
            } => {
                let written = (year.clone(), sample.clone(), key.clone());
                let stored = self
                    .ensure_year(&year)
                    .entry(sample)
                    .or_default()
                    .entry(key)
                    .or_default();
                let before = stored.len();
                for file in files {
                    if !stored.contains(&file) {
                        stored.push(file);
                    }
                }
                state.written_keys.insert(written);
                stored.len() - before
            }
        }
    }

    pub fn apply_all(
        &mut self,
        updates: impl IntoIterator<Item = CatalogUpdate>,
        state: &mut MergeState,
        overwrite_sample: bool,
    ) -> usize {
        updates
            .into_iter()
            .map(|update| self.apply(update, state, overwrite_sample))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(sample: &str) -> CatalogUpdate {
        CatalogUpdate::TouchSample {
            year: "2022".to_string(),
            sample: sample.to_string(),
        }
    }

    fn replace(sample: &str, key: &str, files: &[&str]) -> CatalogUpdate {
        CatalogUpdate::Replace {
            year: "2022".to_string(),
            sample: sample.to_string(),
            key: key.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn extend(sample: &str, key: &str, files: &[&str]) -> CatalogUpdate {
        CatalogUpdate::Extend {
            year: "2022".to_string(),
            sample: sample.to_string(),
            key: key.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn overwrite_sample_resets_once_per_run() {
        let mut catalog = Catalog::new();
        let mut state = MergeState::new();
        catalog.apply_all(
            [touch("QCD"), replace("QCD", "old", &["x.root"])],
            &mut state,
            false,
        );

        let mut state = MergeState::new();
        catalog.apply_all(
            [
                touch("QCD"),
                replace("QCD", "a", &["a.root"]),
                touch("QCD"),
                replace("QCD", "b", &["b.root"]),
            ],
            &mut state,
            true,
        );

        let entry = &catalog.year("2022").unwrap()["QCD"];
        assert!(!entry.contains_key("old"));
        assert_eq!(entry.len(), 2);
    }

    #[test]
    fn keep_existing_keys_without_overwrite() {
        let mut catalog = Catalog::new();
        catalog.apply_all(
            [touch("QCD"), replace("QCD", "old", &["x.root"])],
            &mut MergeState::new(),
            false,
        );
        let mut state = MergeState::new();
        catalog.apply_all(
            [touch("QCD"), replace("QCD", "new", &["y.root"])],
            &mut state,
            false,
        );
        assert_eq!(catalog.files("2022", "QCD", "old"), Some(&["x.root".to_string()][..]));
        assert_eq!(catalog.files("2022", "QCD", "new"), Some(&["y.root".to_string()][..]));
        assert!(state.duplicates().is_empty());
    }

    #[test]
    fn duplicate_within_run_overwrites_and_is_recorded() {
        let mut catalog = Catalog::new();
        let mut state = MergeState::new();
        catalog.apply_all(
            [
                replace("TT", "TTto4Q", &["1.root"]),
                replace("TT", "TTto4Q", &["2.root"]),
            ],
            &mut state,
            false,
        );
        assert_eq!(catalog.files("2022", "TT", "TTto4Q"), Some(&["2.root".to_string()][..]));
        assert_eq!(state.duplicates(), ["2022/TT/TTto4Q".to_string()]);
    }

    #[test]
    fn extend_skips_known_urls() {
        let mut catalog = Catalog::new();
        let mut state = MergeState::new();
        let recorded = catalog.apply_all(
            [
                extend("JetMET", "JetMET_Run2022C", &["a.root", "b.root"]),
                extend("JetMET", "JetMET_Run2022C", &["b.root", "c.root"]),
            ],
            &mut state,
            false,
        );
        assert_eq!(recorded, 3);
        assert_eq!(catalog.files("2022", "JetMET", "JetMET_Run2022C").unwrap().len(), 3);
        assert_eq!(catalog.file_count(), 3);
    }
}
