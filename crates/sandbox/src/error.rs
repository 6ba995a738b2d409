//! Sandbox error types.

use std::path::PathBuf;

use policy::PolicyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// The preset catalog file could not be read.
    #[error("Failed to read preset catalog {path}: {source}")]
    CatalogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog or the built-in rules could not be resolved.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
