use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use tracing::debug;

use crate::domain::RemotePath;
use crate::error::IndexError;

/// Lists the entry names directly under a remote directory.
///
/// Implementations return [`IndexError::NotFound`] when the path is absent or
/// cannot be listed; any other error aborts the crawl.
pub trait DirectoryLister: Send + Sync {
    fn list(&self, path: &RemotePath) -> Result<Vec<String>, IndexError>;
}

impl<T: DirectoryLister + ?Sized> DirectoryLister for &T {
    fn list(&self, path: &RemotePath) -> Result<Vec<String>, IndexError> {
        (**self).list(path)
    }
}

/// Lists through the `xrdfs` command line client.
#[derive(Debug, Clone)]
pub struct XrdfsLister {
    redirector: String,
    xrdfs: Option<PathBuf>,
}

impl XrdfsLister {
    pub fn new(redirector: impl Into<String>) -> Self {
        Self {
            redirector: redirector.into(),
            xrdfs: find_in_path("xrdfs"),
        }
    }

    fn require_xrdfs(&self) -> Result<&PathBuf, IndexError> {
        self.xrdfs
            .as_ref()
            .ok_or_else(|| IndexError::MissingTool("xrdfs".to_string()))
    }
}

impl DirectoryLister for XrdfsLister {
    fn list(&self, path: &RemotePath) -> Result<Vec<String>, IndexError> {
        let xrdfs = self.require_xrdfs()?;
        debug!("xrdfs {} ls {path}", self.redirector);
        let output = Command::new(xrdfs.as_path())
            .arg(&self.redirector)
            .arg("ls")
            .arg(path.as_str())
            .output()
            .map_err(|err| IndexError::Listing(format!("{}: {err}", xrdfs.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("listing {path} failed: {stderr}");
            return Err(IndexError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Entry names from `xrdfs ls` output, one absolute path per line.
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            line.trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// In-memory directory tree, built from file paths.
#[derive(Debug, Default)]
pub struct MemoryLister {
    children: BTreeMap<String, BTreeSet<String>>,
    denied: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lister = Self::new();
        for path in paths {
            lister.add_path(path.as_ref());
        }
        lister
    }

    /// Registers every directory along `path`; the last component becomes a leaf entry.
    pub fn add_path(&mut self, path: &str) {
        let components = path
            .split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>();
        let mut parent = String::from("/");
        for component in components {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(component.to_string());
            parent = RemotePath::new(parent).join(component).to_string();
        }
    }

    /// Makes listing `path` fail with not-found even though it exists.
    pub fn deny(&mut self, path: &str) {
        self.denied.insert(RemotePath::new(path).to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl DirectoryLister for MemoryLister {
    fn list(&self, path: &RemotePath) -> Result<Vec<String>, IndexError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(path.to_string());
        }
        let key = path.to_string();
        if self.denied.contains(&key) {
            return Err(IndexError::NotFound { path: key });
        }
        self.children
            .get(&key)
            .map(|entries| entries.iter().cloned().collect())
            .ok_or(IndexError::NotFound { path: key })
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let plain = path.join(name);
        if is_file(&plain) {
            return Some(plain);
        }
    }
    None
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}
