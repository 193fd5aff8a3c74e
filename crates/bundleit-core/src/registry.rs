use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{BundleError, Result};
use crate::module::{ModuleId, SourceModule};

/// What to do when two files map to the same module identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Last write wins without a word.
    #[serde(rename = "overwrite")]
    Overwrite,
    /// Last write wins and a warning is logged.
    #[default]
    #[serde(rename = "warn")]
    Warn,
    /// Abort the bundle.
    #[serde(rename = "error")]
    Error,
}

/// Outcome of a single [`Registry::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    Overwritten { previous_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RegistryEntry {
    path: PathBuf,
    source: String,
}

/// Build-time table of module identifier to raw source text.
///
/// Sources are stored unescaped; the assembler escapes them on emission.
/// Iteration follows first-insertion order, so feeding sorted discovery
/// output gives a deterministic bundle.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<ModuleId, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module, replacing any earlier module with the same identifier.
    pub fn insert(&mut self, module: SourceModule) -> Insertion {
        let entry = RegistryEntry {
            path: module.path,
            source: module.source,
        };
        match self.entries.insert(module.id, entry) {
            None => Insertion::Inserted,
            Some(previous) => Insertion::Overwritten {
                previous_path: previous.path,
            },
        }
    }

    /// Insert every module, applying `policy` to identifier collisions.
    ///
    /// Returns the identifiers that were overwritten, in the order the
    /// collisions happened.
    pub fn extend_with_policy(
        &mut self,
        modules: impl IntoIterator<Item = SourceModule>,
        policy: CollisionPolicy,
    ) -> Result<Vec<ModuleId>> {
        let mut overwritten = Vec::new();

        for module in modules {
            let id = module.id.clone();
            let path = module.path.clone();
            if let Insertion::Overwritten { previous_path } = self.insert(module) {
                match policy {
                    CollisionPolicy::Overwrite => {}
                    CollisionPolicy::Warn => warn!(
                        "Module '{}' from {:?} replaces the one from {:?}",
                        id, path, previous_path
                    ),
                    CollisionPolicy::Error => {
                        return Err(BundleError::IdentifierCollision {
                            id,
                            first: previous_path,
                            second: path,
                        })
                    }
                }
                overwritten.push(id);
            }
        }

        Ok(overwritten)
    }

    pub fn get(&self, id: &ModuleId) -> Option<&str> {
        self.entries.get(id).map(|entry| entry.source.as_str())
    }

    pub fn path_of(&self, id: &ModuleId) -> Option<&Path> {
        self.entries.get(id).map(|entry| entry.path.as_path())
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &str)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id, entry.source.as_str()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.entries.keys()
    }
}
