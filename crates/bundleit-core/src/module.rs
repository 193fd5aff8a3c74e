use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Separator between path segments in a module identifier.
pub const SEGMENT_DELIMITER: char = '.';

/// Dotted module identifier derived from a path relative to the project root.
///
/// `utils/math.lua` becomes `utils.math`. The identifier is a pure function of
/// the relative path: no file system access, no normalization beyond dropping
/// `.` components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the identifier for `relative`, stripping `extension` (without the
    /// leading dot) from the last segment.
    pub fn from_relative_path(relative: &Path, extension: &str) -> Self {
        let suffix = format!(".{}", extension);
        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let mut id = segments.join(&SEGMENT_DELIMITER.to_string());
        if id.ends_with(&suffix) {
            id.truncate(id.len() - suffix.len());
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A discovered source file. The source is read once and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    pub id: ModuleId,
    pub path: PathBuf,
    pub source: String,
}

/// The module executed unconditionally when the bundle runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryModule {
    pub path: PathBuf,
    pub source: String,
}

impl From<SourceModule> for EntryModule {
    fn from(module: SourceModule) -> Self {
        Self {
            path: module.path,
            source: module.source,
        }
    }
}
