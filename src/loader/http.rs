//! HTTP(S) URLs as data sources.
//!
//! Nothing is fetched at load time. The body is downloaded on the first
//! content read (or the first content-type query when no `mimeType` parameter
//! overrides it) and cached for the life of the data source.

use reqwest::blocking::Client;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{LoadDefaults, source_group, source_name};
use crate::core::{DataSourceError, Result};
use crate::datasource::{Content, DataSource};
use crate::reference::NamedReference;

/// Loader for `http://` and `https://` locators.
///
/// The blocking client is built on first use and shared by every data source
/// this loader creates.
#[derive(Debug)]
pub struct HttpLoader {
    timeout: Duration,
    client: OnceLock<Client>,
}

impl HttpLoader {
    /// A loader whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn accepts(&self, reference: &NamedReference) -> bool {
        matches!(reference.scheme().as_deref(), Some("http" | "https"))
    }

    /// Creates a lazily-fetched data source for the URL.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::MalformedReference`] if the locator is not a
    /// valid URL and [`DataSourceError::Http`] if the client cannot be built.
    pub fn load(&self, reference: &NamedReference, defaults: LoadDefaults<'_>) -> Result<DataSource> {
        let url = Url::parse(reference.target()).map_err(|e| DataSourceError::MalformedReference {
            reference: reference.to_string(),
            reason: format!("invalid URL: {e}"),
        })?;

        let content = Content::http(url.as_str(), self.client(&url)?);
        let mut builder = DataSource::builder(url.as_str(), content)
            .name(source_name(reference))
            .group(source_group(reference, defaults))
            .charset(reference.charset(defaults.charset)?);
        if let Some(mime_type) = reference.mime_type() {
            builder = builder.content_type(mime_type);
        }
        Ok(builder.build())
    }

    fn client(&self, url: &Url) -> Result<Client> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }

        debug!("Building HTTP client with a {:?} timeout", self.timeout);
        let client = Client::builder().timeout(self.timeout).build().map_err(|e| {
            DataSourceError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(self.client.get_or_init(|| client).clone())
    }
}
