use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("remote path not found: {path}")]
    NotFound { path: String },

    #[error(
        "could not determine sample from subsample name: {subsample}. Please check the naming conventions."
    )]
    #[diagnostic(help("add a classification rule for this subsample or filter it out with --subsamples"))]
    Classification { subsample: String },

    #[error("directory listing failed: {0}")]
    Listing(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("invalid layout mode: {0} (expected old|new)")]
    InvalidLayout(String),

    #[error("invalid MC version policy: {0} (expected all|last)")]
    InvalidMcVersions(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(String),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to parse catalog {path}: {message}")]
    CatalogParse { path: String, message: String },

    #[error("failed to start crawl workers: {0}")]
    WorkerPool(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl IndexError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound { .. })
    }
}
