//! Configuration file handling.
//!
//! This module provides loading and saving of plugscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/plugscan/config.toml`
//! - macOS: `~/Library/Application Support/plugscan/config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! extensions = ["component", "vst", "vst3", "aaxplugin"]
//! default_format = "table"
//! prompt = true
//!
//! [[roots]]
//! path = "/Library"
//! domain = "system"
//!
//! [[roots]]
//! path = "/Users/me/Library"
//! domain = "user"
//!
//! [ignore]
//! plugins = ["Waves*", "*Demo"]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::model::{Domain, PluginKind};
use crate::output::OutputFormat;
use crate::platform::library_dir;
use crate::scanner::ExtensionSet;
use crate::service::Root;

/// Application configuration.
///
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use plugscan::Config;
///
/// let config = Config::load().unwrap();
/// println!("Scanning {} roots", config.roots.len());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bundle extensions to recognize. Unknown extensions are ignored.
    ///
    /// Default: `component`, `vst`, `vst3`, `aaxplugin`
    pub extensions: Vec<String>,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Whether to ask before reading a root that has no valid grant.
    ///
    /// When false, any directory the process can already read is scanned.
    /// Default: true
    pub prompt: bool,

    /// Library roots to scan.
    ///
    /// Default: `/Library` (system) and `~/Library` (user)
    pub roots: Vec<RootConfig>,

    /// Plugins to hide from output.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// A configured library root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub path: PathBuf,
    pub domain: Domain,
}

impl From<&RootConfig> for Root {
    fn from(config: &RootConfig) -> Self {
        Root::new(config.path.clone(), config.domain)
    }
}

/// Configuration for hiding specific plugins from results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Plugin names to hide, as case-insensitive globs (e.g. "Waves*", "*Demo").
    pub plugins: Vec<String>,
}

impl IgnoreConfig {
    /// Compiles the name patterns into a single matcher.
    pub fn globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.plugins {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid ignore pattern '{}'", pattern))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        let roots = [Domain::System, Domain::User]
            .into_iter()
            .filter_map(|domain| {
                library_dir(domain).map(|path| RootConfig { path, domain })
            })
            .collect();

        Self {
            extensions: PluginKind::ALL
                .iter()
                .map(|k| k.extension().to_string())
                .collect(),
            default_format: "table".to_string(),
            prompt: true,
            roots,
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from [`config_path`](Self::config_path).
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads and validates configuration from `path`.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Rejects settings no scan could use, such as an extension list with
    /// no plugin format in it.
    pub fn validate(&self) -> Result<()> {
        if self.extension_set().is_empty() {
            bail!(
                "no recognized plugin extension in {:?}; expected some of {}",
                self.extensions,
                PluginKind::ALL.map(|k| k.extension()).join(", ")
            );
        }
        OutputFormat::from_str(&self.default_format).map_err(|e| anyhow!(e))?;
        self.ignore.globset()?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plugscan")
            .join("config.toml")
    }

    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.extensions)
    }

    pub fn scan_roots(&self) -> Vec<Root> {
        self.roots.iter().map(Root::from).collect()
    }
}
