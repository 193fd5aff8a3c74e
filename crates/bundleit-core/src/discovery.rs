//! Project scanning.
//!
//! Walks the project root in sorted order and reads every file with the target
//! extension into a [`SourceModule`].

use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{BundleError, Result};
use crate::module::{ModuleId, SourceModule};

pub struct ModuleDiscoverer {
    root: PathBuf,
    extension: String,
    exclude: Vec<Pattern>,
    skip_paths: Vec<PathBuf>,
}

impl ModuleDiscoverer {
    /// `extension` is given without the leading dot.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            exclude: Vec::new(),
            skip_paths: Vec::new(),
        }
    }

    /// Skip files whose `/`-separated relative path matches any of `patterns`.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let compiled = Pattern::new(pattern).map_err(|source| BundleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    /// Skip one specific file, typically the bundle being written.
    ///
    /// Paths that do not exist yet can never be discovered, so they are ignored.
    pub fn skip_file(mut self, path: &Path) -> Self {
        if let Ok(canonical) = path.canonicalize() {
            self.skip_paths.push(canonical);
        }
        self
    }

    /// Discover every module under the root in sorted traversal order.
    pub fn discover(&self) -> Result<Vec<SourceModule>> {
        if !self.root.is_dir() {
            return Err(BundleError::ProjectDirNotFound(self.root.clone()));
        }

        let suffix = format!(".{}", self.extension);
        let mut modules = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches_extension = path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(&suffix))
                .unwrap_or(false);
            if !matches_extension {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if self.is_excluded(path, relative) {
                debug!("Skipping excluded file {:?}", relative);
                continue;
            }

            let source = std::fs::read_to_string(path).map_err(|source| BundleError::ReadSource {
                path: path.to_path_buf(),
                source,
            })?;
            let id = ModuleId::from_relative_path(relative, &self.extension);
            debug!("Discovered module '{}' at {:?}", id, relative);

            modules.push(SourceModule {
                id,
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(modules)
    }

    fn is_excluded(&self, path: &Path, relative: &Path) -> bool {
        if !self.exclude.is_empty() {
            let normalized = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if self.exclude.iter().any(|p| p.matches(&normalized)) {
                return true;
            }
        }

        if !self.skip_paths.is_empty() {
            if let Ok(canonical) = path.canonicalize() {
                return self.skip_paths.contains(&canonical);
            }
        }

        false
    }
}
