//! End-to-end bundling pipeline: discover, separate the entry, build the
//! registry, assemble, write.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::codegen::BundleAssemblerBuilder;
use crate::config::{BundleConfig, LUA_EXTENSION};
use crate::discovery::ModuleDiscoverer;
use crate::entry::separate_entry;
use crate::errors::{BundleError, Result};
use crate::module::ModuleId;
use crate::registry::Registry;

/// An assembled bundle that has not been written yet.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub code: String,
    pub entry_path: PathBuf,
    pub registry: Registry,
    /// Identifiers whose first module was replaced by a later one
    pub overwritten: Vec<ModuleId>,
}

/// What a completed [`Bundler::run`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub output: PathBuf,
    pub module_count: usize,
    pub overwritten: Vec<ModuleId>,
}

pub struct Bundler {
    project_dir: PathBuf,
    config: BundleConfig,
}

impl Bundler {
    pub fn new(project_dir: impl Into<PathBuf>, config: BundleConfig) -> Self {
        Self {
            project_dir: project_dir.into(),
            config,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.config.bundle_options.output
    }

    /// Build the bundle in memory. Nothing is written.
    pub fn build(&self) -> Result<Bundle> {
        let options = &self.config.bundle_options;

        let modules = ModuleDiscoverer::new(&self.project_dir, LUA_EXTENSION)
            .exclude(&self.config.exclude)?
            .skip_file(&options.output)
            .discover()?;
        debug!("Discovered {} file(s) under {:?}", modules.len(), self.project_dir);

        let (entry, modules) = separate_entry(modules, &options.entry, &self.project_dir)?;
        info!("Entry module: {:?}", entry.path);

        let mut registry = Registry::new();
        let overwritten = registry.extend_with_policy(modules, options.on_collision)?;

        let code = BundleAssemblerBuilder::from_options(options)
            .build()
            .assemble(&registry, &entry);

        Ok(Bundle {
            code,
            entry_path: entry.path,
            registry,
            overwritten,
        })
    }

    /// Write `bundle` to the configured output path in one call.
    pub fn write(&self, bundle: &Bundle) -> Result<()> {
        let output = self.output_path();
        let write_error = |source| BundleError::WriteOutput {
            path: output.to_path_buf(),
            source,
        };
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        std::fs::write(output, &bundle.code).map_err(write_error)?;
        info!("Wrote {} byte(s) to {:?}", bundle.code.len(), output);
        Ok(())
    }

    /// Build and write. On any error no output file is touched.
    pub fn run(&self) -> Result<BundleSummary> {
        let bundle = self.build()?;
        self.write(&bundle)?;

        Ok(BundleSummary {
            output: self.output_path().to_path_buf(),
            module_count: bundle.registry.len(),
            overwritten: bundle.overwritten,
        })
    }
}
