//! Repository module-management configuration
//!
//! Loaded from `gantry.toml` at the repository root. A missing file is not an
//! error; it loads as the default (empty) configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// File name of the module-management configuration file.
pub const CONFIG_FILE_NAME: &str = "gantry.toml";

/// Per-module release policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePolicy {
    /// Indicates that the given module should not be tagged (released).
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_tag: bool,

    /// The semver pre-release track identifier for the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_release: Option<String>,

    /// Alternate location, relative to the module, where generated version
    /// metadata should be written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_package: Option<String>,
}

impl ModulePolicy {
    /// The configured pre-release track, if one is set and non-empty.
    pub fn pre_release_track(&self) -> Option<&str> {
        self.pre_release.as_deref().filter(|s| !s.is_empty())
    }
}

/// Configuration describing how modules and dependencies are managed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Per-module policy keyed by relative repository path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, ModulePolicy>,

    /// Cross-repository version pins keyed by module identity path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

impl Config {
    /// The policy for a module by relative repository path, defaulting when
    /// no policy is configured.
    pub fn module_policy(&self, rel_path: &str) -> ModulePolicy {
        self.modules.get(rel_path).cloned().unwrap_or_default()
    }
}

/// Load the configuration file located in the directory path.
pub fn load_config(dir: &Path) -> Result<Config> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    info!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
    Ok(config)
}

/// Write the configuration to the directory path.
pub fn write_config(dir: &Path, config: &Config) -> Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    std::fs::write(&path, content).map_err(ConfigError::Io)?;
    Ok(())
}

fn is_false(b: &bool) -> bool {
    !*b
}
