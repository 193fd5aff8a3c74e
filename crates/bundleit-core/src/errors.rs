use std::path::PathBuf;
use thiserror::Error;

use crate::module::ModuleId;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project directory not found: {}", .0.display())]
    ProjectDirNotFound(PathBuf),

    #[error("Failed to walk project directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write bundle to {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Entry file '{entry}' not found in {}", root.display())]
    EntryNotFound { entry: String, root: PathBuf },

    #[error(
        "Module identifier '{id}' is produced by both {} and {}",
        first.display(),
        second.display()
    )]
    IdentifierCollision {
        id: ModuleId,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BundleError>;
