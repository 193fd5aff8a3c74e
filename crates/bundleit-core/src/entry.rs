use std::path::Path;
use tracing::warn;

use crate::errors::{BundleError, Result};
use crate::module::{EntryModule, SourceModule};

/// Split discovered modules into the entry module and everything else.
///
/// The entry is matched on base file name alone. When several files share
/// that name, the last one in traversal order wins and the earlier ones are
/// dropped entirely: they land neither in the entry slot nor in the registry.
pub fn separate_entry(
    modules: Vec<SourceModule>,
    entry_name: &str,
    root: &Path,
) -> Result<(EntryModule, Vec<SourceModule>)> {
    let mut entry: Option<SourceModule> = None;
    let mut rest = Vec::with_capacity(modules.len());

    for module in modules {
        let is_entry = module
            .path
            .file_name()
            .map(|name| name == entry_name)
            .unwrap_or(false);

        if !is_entry {
            rest.push(module);
            continue;
        }

        if let Some(previous) = entry.replace(module) {
            warn!(
                "Entry file '{}' found more than once; ignoring {:?}",
                entry_name, previous.path
            );
        }
    }

    match entry {
        Some(entry) => Ok((entry.into(), rest)),
        None => Err(BundleError::EntryNotFound {
            entry: entry_name.to_string(),
            root: root.to_path_buf(),
        }),
    }
}
