//! Loaders turn a single non-directory reference into a [`DataSource`].
//!
//! The loaders form a closed set tried in a fixed order:
//!
//! 1. [`Loader::Environment`] - `env://` locators
//! 2. [`Loader::Http`] - `http://` and `https://` locators
//! 3. [`Loader::File`] - bare paths and `file://` locators
//!
//! The order matters: `env:///PWD` would otherwise be read as a relative path,
//! and a bare `pom.xml` must never reach the HTTP loader. The
//! [`LoaderDispatcher`] invokes the first loader that accepts a reference and
//! reports [`DataSourceError::UnsupportedReference`] when none does.
//!
//! Directory references never reach a loader; the
//! [`resolver`](crate::resolver) expands them through the
//! [`FileEnumerator`](crate::pattern::FileEnumerator) first.

mod env;
mod file;
mod http;

pub use env::EnvironmentLoader;
pub use file::FileLoader;
pub use http::HttpLoader;

use encoding_rs::Encoding;
use std::time::Duration;
use tracing::debug;

use crate::constants::{DEFAULT_GROUP, default_http_timeout};
use crate::core::{DataSourceError, Result};
use crate::datasource::DataSource;
use crate::reference::NamedReference;

/// Values applied to a reference that does not carry its own.
#[derive(Debug, Clone, Copy)]
pub struct LoadDefaults<'a> {
    /// Group for references without a group
    pub group: &'a str,
    /// Charset for references without a `charset` parameter
    pub charset: &'static Encoding,
}

impl Default for LoadDefaults<'_> {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            charset: encoding_rs::UTF_8,
        }
    }
}

/// One loading strategy.
#[derive(Debug)]
pub enum Loader {
    Environment(EnvironmentLoader),
    Http(HttpLoader),
    File(FileLoader),
}

impl Loader {
    /// Short name used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Environment(_) => "environment",
            Self::Http(_) => "http",
            Self::File(_) => "file",
        }
    }

    pub fn accepts(&self, reference: &NamedReference) -> bool {
        match self {
            Self::Environment(loader) => loader.accepts(reference),
            Self::Http(loader) => loader.accepts(reference),
            Self::File(loader) => loader.accepts(reference),
        }
    }

    pub fn load(&self, reference: &NamedReference, defaults: LoadDefaults<'_>) -> Result<DataSource> {
        match self {
            Self::Environment(loader) => loader.load(reference, defaults),
            Self::Http(loader) => loader.load(reference, defaults),
            Self::File(loader) => loader.load(reference, defaults),
        }
    }
}

/// Ordered list of loaders; the first one that accepts a reference wins.
#[derive(Debug)]
pub struct LoaderDispatcher {
    loaders: Vec<Loader>,
}

impl LoaderDispatcher {
    /// The standard chain: environment, then HTTP with `http_timeout`, then file.
    pub fn new(http_timeout: Duration) -> Self {
        Self {
            loaders: vec![
                Loader::Environment(EnvironmentLoader),
                Loader::Http(HttpLoader::new(http_timeout)),
                Loader::File(FileLoader),
            ],
        }
    }

    /// The loaders in dispatch order.
    pub fn loaders(&self) -> &[Loader] {
        &self.loaders
    }

    /// The loader that would handle `reference`.
    pub fn loader_for(&self, reference: &NamedReference) -> Option<&Loader> {
        self.loaders.iter().find(|loader| loader.accepts(reference))
    }

    /// Returns true if some loader accepts `reference`.
    pub fn accept(&self, reference: &NamedReference) -> bool {
        self.loader_for(reference).is_some()
    }

    /// Loads `reference` with the first accepting loader.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::UnsupportedReference`] if no loader accepts
    /// the reference, or whatever the chosen loader fails with.
    pub fn load(&self, reference: &NamedReference, defaults: LoadDefaults<'_>) -> Result<DataSource> {
        let loader =
            self.loader_for(reference).ok_or_else(|| DataSourceError::UnsupportedReference {
                locator: reference.locator().to_string(),
            })?;
        debug!("Loading '{}' with the {} loader", reference, loader.kind());
        loader.load(reference, defaults)
    }
}

impl Default for LoaderDispatcher {
    fn default() -> Self {
        Self::new(default_http_timeout())
    }
}

/// Name for a data source built from `reference`: its own name, else its target.
pub(crate) fn source_name(reference: &NamedReference) -> String {
    reference.name().map_or_else(|| reference.target().to_string(), str::to_string)
}

/// Group for a data source built from `reference`.
pub(crate) fn source_group(reference: &NamedReference, defaults: LoadDefaults<'_>) -> String {
    reference.group().unwrap_or(defaults.group).to_string()
}
