use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::catalog::Catalog;
use crate::crawler::CrawlReport;
use crate::domain::LayoutMode;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub user: String,
    pub layout: LayoutMode,
}

/// Per-year, per-sample subsample and file counts of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub years: BTreeMap<String, BTreeMap<String, SampleSummary>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub subsamples: usize,
    pub files: usize,
}

impl SummaryResult {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let years = catalog
            .years()
            .map(|(year, entry)| {
                let samples: BTreeMap<String, SampleSummary> = entry
                    .iter()
                    .map(|(sample, subsamples)| {
                        (
                            sample.clone(),
                            SampleSummary {
                                subsamples: subsamples.len(),
                                files: subsamples.values().map(Vec::len).sum(),
                            },
                        )
                    })
                    .collect();
                (year.clone(), samples)
            })
            .collect();
        Self { years }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(result: &CrawlReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_layout(result: &LayoutResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_summary(result: &SummaryResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Plain-text rendering for terminals.
pub struct TextOutput;

impl TextOutput {
    pub fn print_report(result: &CrawlReport) {
        let layout = result
            .layout
            .map(|layout| layout.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "layout: {layout}, users: {}, years: {}",
            result.users.join(" "),
            result.years.join(" ")
        );
        for entry in &result.entries {
            println!(
                "  {} {} {}: {} files",
                entry.year, entry.sample, entry.key, entry.files
            );
        }
        println!("files recorded: {}", result.files_recorded);
        if !result.skipped.is_empty() {
            println!("skipped {} unreachable paths:", result.skipped.len());
            for skipped in &result.skipped {
                println!("  {}", skipped.path);
            }
        }
        if !result.duplicates.is_empty() {
            println!("duplicate subsamples: {}", result.duplicates.join(", "));
        }
    }

    pub fn print_layout(result: &LayoutResult) {
        println!("{}: {}", result.user, result.layout);
    }

    pub fn print_summary(result: &SummaryResult) {
        for (year, samples) in &result.years {
            println!("{year}");
            for (sample, summary) in samples {
                println!(
                    "  {sample}: {} subsamples, {} files",
                    summary.subsamples, summary.files
                );
            }
        }
    }
}
