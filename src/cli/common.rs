//! Arguments shared by the commands that resolve references.

use anyhow::{Context, Result};
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::datasource::DataSourceCollection;
use crate::resolver;

/// References plus the resolver options that can override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Named references: [name[:group]=]locator[#key=value&...]
    #[arg(value_name = "REFERENCE")]
    pub references: Vec<String>,

    /// Prepend a data source named "stdin" read from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Only keep files matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Drop files matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Group for references that do not name one
    #[arg(long, value_name = "GROUP")]
    pub default_group: Option<String>,

    /// Charset for references without a charset parameter
    #[arg(long, value_name = "CHARSET")]
    pub default_charset: Option<String>,
}

impl ResolveArgs {
    /// Loads the config file and applies the command-line overrides.
    ///
    /// Include and exclude patterns given on the command line replace those
    /// of the file rather than extending them.
    pub fn resolver_config(&self, config_path: Option<PathBuf>) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::load_with_optional(config_path)?;

        if !self.include.is_empty() {
            config.include = self.include.clone();
        }
        if !self.exclude.is_empty() {
            config.exclude = self.exclude.clone();
        }
        if let Some(group) = &self.default_group {
            config.default_group = group.clone();
        }
        if let Some(charset) = &self.default_charset {
            config.default_charset = charset.clone();
        }

        debug!("Resolver configuration: {:?}", config);
        Ok(config)
    }

    /// Resolves the references into a collection.
    pub fn resolve(&self, config: &ResolverConfig) -> Result<DataSourceCollection> {
        if self.references.is_empty() && !self.stdin {
            warn!("No references given; the collection will be empty");
        }

        let collection = if self.stdin {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                warn!("Reading data source 'stdin' from a terminal; end input with Ctrl-D");
            }
            resolver::resolve_with_stdin(&self.references, config, stdin.lock())
        } else {
            resolver::resolve(&self.references, config)
        };

        collection.context("Failed to resolve data sources")
    }
}

/// Runs `f` with the collection and closes it afterwards, success or not.
///
/// An error from `f` takes precedence over an error from closing.
pub fn with_collection<T>(
    collection: DataSourceCollection,
    f: impl FnOnce(&DataSourceCollection) -> Result<T>,
) -> Result<T> {
    let result = f(&collection);
    let closed = collection.close();

    let value = result?;
    closed.context("Failed to close data sources")?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::DataSource;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_replace_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "include = [\"*.csv\"]\ndefault-group = \"site\"\n").unwrap();

        let args = ResolveArgs {
            include: vec!["*.xml".to_string()],
            default_charset: Some("ISO-8859-1".to_string()),
            ..ResolveArgs::default()
        };
        let config = args.resolver_config(Some(path)).unwrap();

        assert_eq!(config.include, vec!["*.xml"]);
        assert_eq!(config.default_group, "site");
        assert_eq!(config.default_charset, "ISO-8859-1");
    }

    #[test]
    fn test_with_collection_closes_on_error() {
        let collection: DataSourceCollection =
            [DataSource::from_string("a", "1")].into_iter().collect();
        let shared = collection.clone();

        let result: Result<()> = with_collection(collection, |_| anyhow::bail!("render failed"));

        assert!(result.is_err());
        assert!(shared.get("a").unwrap().is_closed());
    }
}
