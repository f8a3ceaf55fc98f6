//! Walks the remote store and turns what it finds into catalog updates.
//!
//! Every (user, year, data|mc) combination is crawled as an independent
//! branch that only reads from the store and returns an ordered list of
//! [`CatalogUpdate`]s. Branches may run on a worker pool; their updates are
//! applied to the catalog afterwards by a single writer, in branch order, so
//! the result does not depend on `jobs`.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogUpdate, MergeState};
use crate::classify::classify;
use crate::domain::{
    LayoutMode, McVersionPolicy, RemotePath, canonical_subsample, correct_mislabelled,
    data_run_key, year_dir_name,
};
use crate::error::IndexError;
use crate::layout::detect_layout;
use crate::listing::DirectoryLister;

/// Directory levels below a dataset-version directory: timestamp, then chunk.
pub const VERSION_DEPTH: usize = 2;

/// Directory levels below a subsample directory.
pub const SUBSAMPLE_DEPTH: usize = VERSION_DEPTH + 1;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub redirector: String,
    pub base_dir: RemotePath,
    pub users: Option<Vec<String>>,
    pub years: Vec<String>,
    pub samples: Option<Vec<String>>,
    pub subsamples: Option<Vec<String>>,
    pub overwrite_sample: bool,
    pub suffix: String,
    pub data_samples: Vec<String>,
    pub layout: Option<LayoutMode>,
    pub mc_versions: McVersionPolicy,
    pub jobs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub layout: Option<LayoutMode>,
    pub users: Vec<String>,
    pub years: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
    pub files_recorded: usize,
    pub entries: Vec<ReportEntry>,
    pub skipped: Vec<SkippedPath>,
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub year: String,
    pub sample: String,
    pub key: String,
    /// Files newly recorded under `key`; URLs already in the catalog are not counted.
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPath {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
struct Branch {
    user: String,
    year: String,
    /// `None` for the old layout, where data/mc is decided per sample.
    is_data: Option<bool>,
}

#[derive(Debug, Default)]
struct BranchOutcome {
    updates: Vec<CatalogUpdate>,
    skipped: Vec<SkippedPath>,
}

impl BranchOutcome {
    fn skip(&mut self, path: &RemotePath, err: &IndexError) {
        warn!("Could not access {path}");
        self.skipped.push(SkippedPath {
            path: path.to_string(),
            reason: err.to_string(),
        });
    }
}

/// Lists `path` and collects suffix-matching files `depth` levels below it.
///
/// Depth 0 means `path` is a chunk directory holding the files. Not-found
/// errors at any level are returned unchanged so the caller decides what to skip.
pub fn collect_files<L: DirectoryLister + ?Sized>(
    lister: &L,
    path: &RemotePath,
    depth: usize,
    suffix: &str,
    redirector: &str,
) -> Result<Vec<String>, IndexError> {
    let entries = lister.list(path)?;
    if depth == 0 {
        return Ok(entries
            .iter()
            .filter(|entry| entry.ends_with(suffix))
            .map(|entry| path.file_url(redirector, entry))
            .collect());
    }

    let mut files = Vec::new();
    for entry in &entries {
        files.extend(collect_files(
            lister,
            &(path / entry),
            depth - 1,
            suffix,
            redirector,
        )?);
    }
    Ok(files)
}

pub struct Crawler<L: DirectoryLister> {
    lister: L,
    options: CrawlOptions,
}

impl<L: DirectoryLister> Crawler<L> {
    pub fn new(lister: L, options: CrawlOptions) -> Self {
        Self { lister, options }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawls every requested branch and merges the result into `catalog`.
    ///
    /// On error the catalog is left untouched.
    pub fn crawl(&self, catalog: &mut Catalog) -> Result<CrawlReport, IndexError> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let options = &self.options;

        let users = match &options.users {
            Some(users) => users.clone(),
            None => self.lister.list(&options.base_dir)?,
        };

        if users.is_empty() {
            info!("no users to search");
            return Ok(CrawlReport {
                layout: None,
                users,
                years: options.years.clone(),
                started_at,
                finished_at: chrono::Utc::now().to_rfc3339(),
                files_recorded: 0,
                entries: Vec::new(),
                skipped: Vec::new(),
                duplicates: Vec::new(),
            });
        }

        let layout = match options.layout {
            Some(layout) => layout,
            None => detect_layout(&self.lister, &options.base_dir, &users[0], &options.years)?,
        };
        info!("Using {layout} directory structure");

        let branches = plan_branches(&users, &options.years, layout);
        let outcomes = self.run_branches(&branches)?;

        for year in &options.years {
            catalog.ensure_year(year);
        }

        let mut state = MergeState::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            for update in outcome.updates {
                let entry = match &update {
                    CatalogUpdate::Replace {
                        year,
                        sample,
                        key,
                        ..
                    }
                    | CatalogUpdate::Extend {
                        year,
                        sample,
                        key,
                        ..
                    } => Some((year.clone(), sample.clone(), key.clone())),
                    CatalogUpdate::TouchSample { .. } => None,
                };
                let recorded = catalog.apply(update, &mut state, options.overwrite_sample);
                if let Some((year, sample, key)) = entry {
                    entries.push(ReportEntry {
                        year,
                        sample,
                        key,
                        files: recorded,
                    });
                }
            }
            skipped.extend(outcome.skipped);
        }

        Ok(CrawlReport {
            layout: Some(layout),
            users,
            years: options.years.clone(),
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            files_recorded: entries.iter().map(|entry| entry.files).sum(),
            entries,
            skipped,
            duplicates: state.duplicates().to_vec(),
        })
    }

    fn run_branches(&self, branches: &[Branch]) -> Result<Vec<BranchOutcome>, IndexError> {
        if self.options.jobs <= 1 {
            return branches
                .iter()
                .map(|branch| self.crawl_branch(branch))
                .collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
            .map_err(|err| IndexError::WorkerPool(err.to_string()))?;
        pool.install(|| {
            branches
                .par_iter()
                .map(|branch| self.crawl_branch(branch))
                .collect()
        })
    }

    fn crawl_branch(&self, branch: &Branch) -> Result<BranchOutcome, IndexError> {
        info!("{} {}", branch.user, branch.year);
        match branch.is_data {
            Some(is_data) => self.crawl_new(&branch.user, &branch.year, is_data),
            None => self.crawl_old(&branch.user, &branch.year),
        }
    }

    /// `{user}/data_{year}|mc_{year}/{subsample}/{version}/{timestamp}/{chunk}/`
    fn crawl_new(
        &self,
        user: &str,
        year: &str,
        is_data: bool,
    ) -> Result<BranchOutcome, IndexError> {
        let options = &self.options;
        let mut outcome = BranchOutcome::default();
        let ypath = &(&options.base_dir / user) / year_dir_name(year, is_data).as_str();

        let subsamples = match &options.subsamples {
            Some(subsamples) => fixed_subsamples(subsamples, is_data)?,
            None => match self.lister.list(&ypath) {
                Ok(entries) => entries,
                Err(err) if err.is_not_found() => {
                    outcome.skip(&ypath, &err);
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            },
        };

        for subsample in &subsamples {
            info!("Processing {subsample}");
            let sample = classify(subsample, is_data)?;
            if !self.wants_sample(&sample) {
                debug!("skipping {subsample}: sample {sample} not requested");
                continue;
            }

            outcome.updates.push(CatalogUpdate::TouchSample {
                year: year.to_string(),
                sample: sample.clone(),
            });

            let spath = &ypath / subsample;
            let collected = if is_data {
                self.data_runs(&spath, &sample, year)
            } else {
                self.mc_files(&spath)
                    .map(|files| vec![self.mc_update(year, &sample, subsample, files)])
            };

            match collected {
                Ok(updates) => outcome.updates.extend(updates),
                Err(err) if err.is_not_found() => outcome.skip(&spath, &err),
                Err(err) => return Err(err),
            }
        }

        Ok(outcome)
    }

    /// `{user}/{year}/{sample}/{subsample}/{version}/{timestamp}/{chunk}/`
    fn crawl_old(&self, user: &str, year: &str) -> Result<BranchOutcome, IndexError> {
        let options = &self.options;
        let mut outcome = BranchOutcome::default();
        let ypath = &(&options.base_dir / user) / year;

        let samples = match &options.samples {
            Some(samples) => samples.clone(),
            None => match self.lister.list(&ypath) {
                Ok(entries) => entries,
                Err(err) if err.is_not_found() => {
                    outcome.skip(&ypath, &err);
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            },
        };

        for sample in &samples {
            info!("{sample}");
            outcome.updates.push(CatalogUpdate::TouchSample {
                year: year.to_string(),
                sample: sample.clone(),
            });

            let spath = &ypath / sample;
            let is_data = options.data_samples.contains(sample);

            let subsamples = match &options.subsamples {
                Some(subsamples) => subsamples.clone(),
                None => match self.lister.list(&spath) {
                    Ok(entries) => entries,
                    Err(err) if err.is_not_found() => {
                        outcome.skip(&spath, &err);
                        continue;
                    }
                    Err(err) => return Err(err),
                },
            };

            for subsample in &subsamples {
                let sspath = &spath / subsample;
                let collected = if is_data {
                    self.old_data_runs(&sspath, sample, year)
                } else {
                    self.mc_files(&sspath).map(|files| {
                        vec![CatalogUpdate::Replace {
                            year: year.to_string(),
                            sample: sample.clone(),
                            key: canonical_subsample(subsample).to_string(),
                            files,
                        }]
                    })
                };

                match collected {
                    Ok(updates) => outcome.updates.extend(updates),
                    Err(err) if err.is_not_found() => outcome.skip(&sspath, &err),
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(outcome)
    }

    fn wants_sample(&self, sample: &str) -> bool {
        self.options
            .samples
            .as_ref()
            .is_none_or(|samples| samples.iter().any(|s| s == sample))
    }

    fn collect(&self, path: &RemotePath, depth: usize) -> Result<Vec<String>, IndexError> {
        collect_files(
            &self.lister,
            path,
            depth,
            &self.options.suffix,
            &self.options.redirector,
        )
    }

    /// Files of one MC subsample according to the configured version policy.
    fn mc_files(&self, spath: &RemotePath) -> Result<Vec<String>, IndexError> {
        match self.options.mc_versions {
            McVersionPolicy::All => self.collect(spath, SUBSAMPLE_DEPTH),
            McVersionPolicy::Last => {
                let versions = self.lister.list(spath)?;
                match versions.last() {
                    Some(version) => self.collect(&(spath / version), VERSION_DEPTH),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn mc_update(
        &self,
        year: &str,
        sample: &str,
        subsample: &str,
        files: Vec<String>,
    ) -> CatalogUpdate {
        let mut key = canonical_subsample(subsample).to_string();
        if let Some(corrected) = correct_mislabelled(&key) {
            warn!("Renaming subsample {key} to {corrected} due to mislabelling in MC.");
            key = corrected;
        }
        info!("{key}: {} files", files.len());
        CatalogUpdate::Replace {
            year: year.to_string(),
            sample: sample.to_string(),
            key,
            files,
        }
    }

    /// New layout data: one extend per dataset-version directory, keyed by run.
    fn data_runs(
        &self,
        spath: &RemotePath,
        sample: &str,
        year: &str,
    ) -> Result<Vec<CatalogUpdate>, IndexError> {
        let mut updates = Vec::new();
        for version in self.lister.list(spath)? {
            let files = self.collect(&(spath / &version), VERSION_DEPTH)?;
            let key = data_run_key(sample, &version);
            info!("{key}: {} files added", files.len());
            updates.push(CatalogUpdate::Extend {
                year: year.to_string(),
                sample: sample.to_string(),
                key,
                files,
            });
        }
        Ok(updates)
    }

    /// Old layout data: one entry per dataset-version directory, keyed by its name.
    fn old_data_runs(
        &self,
        sspath: &RemotePath,
        sample: &str,
        year: &str,
    ) -> Result<Vec<CatalogUpdate>, IndexError> {
        let mut updates = Vec::new();
        for version in self.lister.list(sspath)? {
            let files = self.collect(&(sspath / &version), VERSION_DEPTH)?;
            info!("{version}: {} files", files.len());
            updates.push(CatalogUpdate::Replace {
                year: year.to_string(),
                sample: sample.to_string(),
                key: version,
                files,
            });
        }
        Ok(updates)
    }
}

/// The part of a caller-supplied subsample list that belongs under `data_` (or `mc_`).
///
/// MC patterns are checked first since generic data patterns such as `Tau`
/// also occur inside MC names. Names of the other kind are left for the
/// other branch; names that are neither data nor MC fail classification.
fn fixed_subsamples(subsamples: &[String], is_data: bool) -> Result<Vec<String>, IndexError> {
    let mut selected = Vec::new();
    for subsample in subsamples {
        let subsample_is_data = if classify(subsample, false).is_ok() {
            false
        } else {
            classify(subsample, true)?;
            true
        };
        if subsample_is_data == is_data {
            selected.push(subsample.clone());
        } else {
            debug!("{subsample} belongs to the other branch");
        }
    }
    Ok(selected)
}

fn plan_branches(users: &[String], years: &[String], layout: LayoutMode) -> Vec<Branch> {
    let kinds: &[Option<bool>] = match layout {
        LayoutMode::New => &[Some(true), Some(false)],
        LayoutMode::Old => &[None],
    };
    users
        .iter()
        .flat_map(|user| {
            years.iter().flat_map(move |year| {
                kinds.iter().map(move |is_data| Branch {
                    user: user.clone(),
                    year: year.clone(),
                    is_data: *is_data,
                })
            })
        })
        .collect()
}
