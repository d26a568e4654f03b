//! Resolver configuration.
//!
//! The resolver takes its defaults from a [`ResolverConfig`] value passed in
//! by the caller; nothing is read from global state. The CLI builds that value
//! from an optional TOML file and then applies its own flags on top.
//!
//! # Configuration File
//!
//! **Location:**
//! - Unix/macOS: `~/.tmplgen/config.toml`
//! - Windows: `%LOCALAPPDATA%\tmplgen\config.toml`
//!
//! A missing file at the default location is not an error; every key has a
//! default.
//!
//! ```toml
//! # Group for references that do not name one
//! default-group = "default"
//!
//! # Charset for references without a #charset= parameter
//! default-charset = "UTF-8"
//!
//! # Glob filters applied to file references and directory contents
//! include = ["*.csv", "*.json"]
//! exclude = ["tmp/*"]
//!
//! # Timeout for HTTP fetches, in seconds
//! http-timeout-secs = 30
//! ```

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_CHARSET, DEFAULT_GROUP, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::loader::LoadDefaults;
use crate::reference::lookup_charset;

/// Defaults and filters for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Group for references without a group
    pub default_group: String,

    /// Charset label for references without a `charset` parameter
    pub default_charset: String,

    /// Include globs; empty means every file
    pub include: Vec<String>,

    /// Exclude globs
    pub exclude: Vec<String>,

    /// Timeout for HTTP fetches, in seconds
    pub http_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_group: DEFAULT_GROUP.to_string(),
            default_charset: DEFAULT_CHARSET.to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl ResolverConfig {
    /// Loads the configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this structure.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Platform-specific location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or, on Windows, local data) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("tmplgen")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".tmplgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The default charset, checked against the charset registry.
    pub fn charset(&self) -> crate::core::Result<&'static Encoding> {
        lookup_charset(&self.default_charset)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Defaults handed to the loaders.
    pub fn load_defaults(&self) -> crate::core::Result<LoadDefaults<'_>> {
        Ok(LoadDefaults {
            group: &self.default_group,
            charset: self.charset()?,
        })
    }
}
