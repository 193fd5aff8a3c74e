use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{BundleError, Result};
use crate::registry::CollisionPolicy;

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "bundleit.yaml";

/// File extension of Lua sources, without the dot.
pub const LUA_EXTENSION: &str = "lua";

pub const DEFAULT_ENTRY: &str = "main.lua";
pub const DEFAULT_OUTPUT: &str = "bundle.lua";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LuaVersion {
    #[serde(rename = "5.1")]
    Lua51,
    #[serde(rename = "5.2")]
    Lua52,
    #[serde(rename = "5.3")]
    Lua53,
    #[default]
    #[serde(rename = "5.4")]
    Lua54,
}

impl FromStr for LuaVersion {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "5.1" | "51" => Ok(LuaVersion::Lua51),
            "5.2" | "52" => Ok(LuaVersion::Lua52),
            "5.3" | "53" => Ok(LuaVersion::Lua53),
            "5.4" | "54" => Ok(LuaVersion::Lua54),
            _ => Err(BundleError::Config(format!(
                "Invalid Lua target '{}'. Supported targets: 5.1, 5.2, 5.3, 5.4",
                s
            ))),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "warn" => Ok(CollisionPolicy::Warn),
            "error" => Ok(CollisionPolicy::Error),
            _ => Err(BundleError::Config(format!(
                "Invalid collision policy '{}'. Expected one of: overwrite, warn, error",
                s
            ))),
        }
    }
}

/// Options that control how a project is bundled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOptions {
    /// Base file name of the entry module (default: main.lua)
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Output file (default: bundle.lua)
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Target Lua version (default: 5.4)
    #[serde(default)]
    pub target: LuaVersion,

    /// Handling of module identifier collisions (default: warn)
    #[serde(default)]
    pub on_collision: CollisionPolicy,

    /// Fail cyclic requires at run time instead of recursing (default: false)
    #[serde(default)]
    pub detect_cycles: bool,
}

fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            output: default_output(),
            target: LuaVersion::default(),
            on_collision: CollisionPolicy::default(),
            detect_cycles: false,
        }
    }
}

/// Main bundler configuration, as stored in `bundleit.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    #[serde(default)]
    pub bundle_options: BundleOptions,

    /// Files to leave out of the bundle (glob patterns on relative paths)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Values given on the command line. `None` leaves the config value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub entry: Option<String>,
    pub output: Option<PathBuf>,
    pub target: Option<LuaVersion>,
    pub on_collision: Option<CollisionPolicy>,
    pub detect_cycles: Option<bool>,
    pub exclude: Vec<String>,
}

impl BundleConfig {
    /// Load configuration from a YAML file.
    ///
    /// A relative `output` is resolved against the directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        if config.bundle_options.output.is_relative() {
            if let Some(dir) = path.parent() {
                config.bundle_options.output = dir.join(&config.bundle_options.output);
            }
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| BundleError::Config(e.to_string()))
    }

    /// Load `bundleit.yaml` from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&BundleConfig::default())
            .map_err(|e| BundleError::Config(e.to_string()))?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Apply command line overrides on top of this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let options = &mut self.bundle_options;
        if let Some(ref entry) = overrides.entry {
            options.entry = entry.clone();
        }
        if let Some(ref output) = overrides.output {
            options.output = output.clone();
        }
        if let Some(target) = overrides.target {
            options.target = target;
        }
        if let Some(policy) = overrides.on_collision {
            options.on_collision = policy;
        }
        if let Some(detect_cycles) = overrides.detect_cycles {
            options.detect_cycles = detect_cycles;
        }
        self.exclude.extend(overrides.exclude.iter().cloned());
    }
}
