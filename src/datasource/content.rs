//! Content backends of a data source.
//!
//! Every backend opens a fresh stream per call. File content is read from disk
//! on each open; in-memory content is served from a shared buffer; HTTP
//! content is fetched on first use and cached for the life of the data source.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::constants::MIME_APPLICATION_OCTET_STREAM;
use crate::core::{DataSourceError, Result};

/// Where the bytes of a data source come from.
#[derive(Debug)]
pub struct Content {
    kind: ContentKind,
}

#[derive(Debug)]
enum ContentKind {
    File(PathBuf),
    Bytes(Arc<[u8]>),
    Http(HttpContent),
}

impl Content {
    /// Content read from a file on every open.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ContentKind::File(path.into()),
        }
    }

    /// In-memory content.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            kind: ContentKind::Bytes(Arc::from(bytes)),
        }
    }

    /// In-memory text, stored as UTF-8.
    pub fn text(text: impl Into<String>) -> Self {
        Self::bytes(text.into().into_bytes())
    }

    /// Content fetched from `url` on first use.
    pub fn http(url: impl Into<String>, client: Client) -> Self {
        Self {
            kind: ContentKind::Http(HttpContent {
                url: url.into(),
                client,
                fetched: Mutex::new(None),
            }),
        }
    }

    /// Backing file, for file content.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            ContentKind::File(path) => Some(path),
            _ => None,
        }
    }

    /// Returns true for HTTP content.
    pub fn is_http(&self) -> bool {
        matches!(self.kind, ContentKind::Http(_))
    }

    /// Opens a fresh stream over the content.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.kind {
            ContentKind::File(path) => {
                let file = File::open(path).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => DataSourceError::FileNotFound {
                        path: path.display().to_string(),
                    },
                    _ => DataSourceError::Io(e),
                })?;
                Ok(Box::new(file))
            }
            ContentKind::Bytes(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
            ContentKind::Http(http) => Ok(Box::new(Cursor::new(http.fetch()?.body.clone()))),
        }
    }

    /// Length in bytes without consuming a stream.
    ///
    /// `None` means unknown: HTTP content before it has been fetched, or a
    /// file whose metadata cannot be read.
    pub fn length(&self) -> Option<u64> {
        match &self.kind {
            ContentKind::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            ContentKind::Bytes(bytes) => Some(bytes.len() as u64),
            ContentKind::Http(http) => http.fetched().map(|body| body.body.len() as u64),
        }
    }

    /// Content type derived from the content itself.
    ///
    /// Files use their extension, HTTP content the response header (fetching
    /// if necessary), in-memory content has none.
    pub fn derived_content_type(&self) -> Result<Option<String>> {
        match &self.kind {
            ContentKind::File(path) => Ok(Some(
                mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string(),
            )),
            ContentKind::Bytes(_) => Ok(None),
            ContentKind::Http(http) => Ok(http.fetch()?.content_type.clone()),
        }
    }
}

struct HttpBody {
    body: Arc<[u8]>,
    content_type: Option<String>,
}

struct HttpContent {
    url: String,
    client: Client,
    fetched: Mutex<Option<Arc<HttpBody>>>,
}

impl HttpContent {
    fn fetched(&self) -> Option<Arc<HttpBody>> {
        self.fetched.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn fetch(&self) -> Result<Arc<HttpBody>> {
        let mut fetched = self.fetched.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(body) = fetched.as_ref() {
            return Ok(Arc::clone(body));
        }

        debug!("Fetching {}", self.url);
        let http_error = |reason: String| DataSourceError::Http {
            url: self.url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| http_error(e.to_string()))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty());

        let body = response.bytes().map_err(|e| http_error(e.to_string()))?;
        debug!("Fetched {} byte(s) from {} ({:?})", body.len(), self.url, content_type);

        let body = Arc::new(HttpBody {
            body: Arc::from(&body[..]),
            content_type,
        });
        *fetched = Some(Arc::clone(&body));
        Ok(body)
    }
}

impl fmt::Debug for HttpContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpContent")
            .field("url", &self.url)
            .field("fetched", &self.fetched().is_some())
            .finish()
    }
}

/// Fallback content type when nothing else is known.
pub(crate) fn fallback_content_type() -> String {
    MIME_APPLICATION_OCTET_STREAM.to_string()
}
