//! Resolution of named references into a data source collection.
//!
//! This is the entry point of the pipeline:
//!
//! ```text
//! reference strings
//!   -> NamedReference::parse
//!   -> directory?  FileEnumerator, one data source per accepted file
//!      otherwise   LoaderDispatcher (environment, http, file)
//!   -> DataSourceCollection
//! ```
//!
//! # Naming
//!
//! - a reference without a name is named by its locator (`pom.xml`,
//!   `https://example.com/users.csv`, `env:///PWD`)
//! - files found under a named directory are named `<name>/<relative path>`
//! - files found under an unnamed directory are named `<root>/<relative path>`
//!
//! # Filtering
//!
//! The include and exclude patterns of the [`ResolverConfig`] apply to every
//! file, whether it was found under a directory or referenced directly. A
//! directly referenced file that does not exist is still an error, even if the
//! patterns would have skipped it.
//!
//! # Failure
//!
//! Resolution is fail-fast. The first reference that cannot be resolved aborts
//! the run; data sources created for earlier references are closed before the
//! error is returned.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tmplgen_cli::config::ResolverConfig;
//! use tmplgen_cli::resolver::resolve;
//!
//! # fn example() -> tmplgen_cli::core::Result<()> {
//! let config = ResolverConfig {
//!     include: vec!["*.xml".to_string()],
//!     ..ResolverConfig::default()
//! };
//! let references = ["pom.xml", "README.md", "./src/test/data"].map(String::from);
//!
//! let collection = resolve(&references, &config)?;
//! assert_eq!(collection.names(), vec!["pom.xml"]);
//! collection.close()?;
//! # Ok(())
//! # }
//! ```

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::constants::{MIME_TEXT_PLAIN, STDIN_NAME, STDIN_URI};
use crate::core::Result;
use crate::datasource::{Content, DataSource, DataSourceCollection};
use crate::loader::{FileLoader, LoadDefaults, LoaderDispatcher};
use crate::pattern::FileEnumerator;
use crate::reference::NamedReference;

/// Resolves `references` into a collection.
///
/// # Errors
///
/// Returns the error of the first reference that fails to parse or load.
pub fn resolve<S: AsRef<str>>(
    references: &[S],
    config: &ResolverConfig,
) -> Result<DataSourceCollection> {
    Resolver::new(config)?.resolve_all(references, None)
}

/// Resolves `references` and prepends a `stdin` data source read from `stdin`.
///
/// Standard input is buffered completely before any reference is resolved.
///
/// # Errors
///
/// Returns the error of the first reference that fails, or an I/O error if
/// reading `stdin` fails.
pub fn resolve_with_stdin<S: AsRef<str>>(
    references: &[S],
    config: &ResolverConfig,
    mut stdin: impl Read,
) -> Result<DataSourceCollection> {
    let mut buffer = Vec::new();
    stdin.read_to_end(&mut buffer)?;
    Resolver::new(config)?.resolve_all(references, Some(buffer))
}

/// Resolver state for one run: defaults, loaders and file filters.
#[derive(Debug)]
pub struct Resolver<'a> {
    defaults: LoadDefaults<'a>,
    dispatcher: LoaderDispatcher,
    enumerator: FileEnumerator,
}

impl<'a> Resolver<'a> {
    /// Prepares a resolver for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedCharset`](crate::core::DataSourceError::UnsupportedCharset)
    /// for an unknown default charset and
    /// [`InvalidPattern`](crate::core::DataSourceError::InvalidPattern) for a bad filter.
    pub fn new(config: &'a ResolverConfig) -> Result<Self> {
        Ok(Self {
            defaults: config.load_defaults()?,
            dispatcher: LoaderDispatcher::new(config.http_timeout()),
            enumerator: FileEnumerator::new(&config.include, &config.exclude)?,
        })
    }

    /// Resolves every reference in order, with an optional stdin buffer first.
    ///
    /// # Errors
    ///
    /// Returns the first failure after closing what was already created.
    pub fn resolve_all<S: AsRef<str>>(
        &self,
        references: &[S],
        stdin: Option<Vec<u8>>,
    ) -> Result<DataSourceCollection> {
        let mut data_sources = Vec::new();

        if let Some(buffer) = stdin {
            data_sources.push(self.stdin_source(buffer));
        }

        for input in references {
            let resolved =
                NamedReference::parse(input.as_ref()).and_then(|reference| self.resolve(&reference));
            match resolved {
                Ok(resolved) => data_sources.extend(resolved),
                Err(e) => {
                    debug!("Resolution of '{}' failed: {}", input.as_ref(), e);
                    abandon(&data_sources);
                    return Err(e);
                }
            }
        }

        debug!("Resolved {} reference(s) into {} data source(s)", references.len(), data_sources.len());
        Ok(data_sources.into_iter().map(Arc::new).collect())
    }

    /// Resolves a single reference into zero or more data sources.
    ///
    /// A directory yields one data source per accepted file; a file skipped by
    /// the filters yields none; anything else yields exactly one.
    ///
    /// # Errors
    ///
    /// See [`LoaderDispatcher::load`] and [`FileEnumerator::enumerate`].
    pub fn resolve(&self, reference: &NamedReference) -> Result<Vec<DataSource>> {
        if let Some(path) = reference.file() {
            if path.is_dir() {
                return self.resolve_directory(reference, &path);
            }
            if path.is_file() && !self.enumerator.accepts(&file_name(&path)) {
                debug!("Skipping '{}': rejected by include/exclude patterns", reference);
                return Ok(Vec::new());
            }
        }

        Ok(vec![self.dispatcher.load(reference, self.defaults)?])
    }

    fn resolve_directory(&self, reference: &NamedReference, root: &Path) -> Result<Vec<DataSource>> {
        let prefix = match reference.name() {
            Some(name) => name.to_string(),
            None => root.display().to_string().replace('\\', "/"),
        };
        let prefix = prefix.trim_end_matches('/');

        let matches = self.enumerator.enumerate(&[root])?;
        debug!("Directory '{}' expanded to {} file(s)", reference, matches.len());

        let mut data_sources = Vec::with_capacity(matches.len());
        for matched in matches {
            let name = format!("{}/{}", prefix, matched.relative_path);
            match FileLoader.load_path(
                &matched.path,
                name,
                &matched.relative_path,
                reference,
                self.defaults,
            ) {
                Ok(data_source) => data_sources.push(data_source),
                Err(e) => {
                    abandon(&data_sources);
                    return Err(e);
                }
            }
        }
        Ok(data_sources)
    }

    fn stdin_source(&self, buffer: Vec<u8>) -> DataSource {
        debug!("Buffered {} byte(s) from standard input", buffer.len());
        DataSource::builder(STDIN_URI, Content::bytes(buffer))
            .name(STDIN_NAME)
            .group(self.defaults.group)
            .content_type(MIME_TEXT_PLAIN)
            .charset(self.defaults.charset)
            .build()
    }
}

/// Closes data sources of a run that is being aborted.
fn abandon(data_sources: &[DataSource]) {
    for data_source in data_sources {
        if let Err(e) = data_source.close() {
            warn!("Failed to close '{}' after aborted resolution: {}", data_source.name(), e);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}
