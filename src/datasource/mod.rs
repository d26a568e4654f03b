//! Data sources: named, grouped, lazily-readable content handles.
//!
//! A [`DataSource`] is what a resolved reference turns into. It carries
//! metadata (name, group, uri, content type, charset, relative path) and a
//! [`Content`] backend that is opened afresh on every read. Nothing is read at
//! construction time, so building a collection of thousands of files costs a
//! directory walk and nothing more.
//!
//! # Resource Tracking
//!
//! Streams handed out through [`DataSource::input_stream`] and
//! [`DataSource::line_iterator`] are registered with the data source's
//! [`ResourceRegistry`]. Closing the data source (explicitly or by dropping
//! it) releases every one of them, in the order they were handed out. After
//! close every content accessor fails with
//! [`DataSourceError::ClosedResource`].
//!
//! # Examples
//!
//! ```rust
//! use tmplgen_cli::datasource::DataSource;
//!
//! let source = DataSource::from_string("greeting", "hello\nworld");
//! assert_eq!(source.name(), "greeting");
//! assert_eq!(source.lines()?, vec!["hello", "world"]);
//! assert_eq!(source.length()?, Some(11));
//!
//! source.close()?;
//! assert!(source.text().is_err());
//! # Ok::<(), tmplgen_cli::core::DataSourceError>(())
//! ```

pub mod collection;
mod content;
mod registry;

pub use collection::DataSourceCollection;
pub use content::Content;
pub use registry::{LineIterator, ResourceRegistry, TrackedReader};

use encoding_rs::Encoding;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::constants::{DEFAULT_GROUP, MIME_TEXT_PLAIN};
use crate::core::{DataSourceError, Result};

/// Metadata key of the data source name.
pub const KEY_NAME: &str = "name";
/// Metadata key of the group.
pub const KEY_GROUP: &str = "group";
/// Metadata key of the canonical URI.
pub const KEY_URI: &str = "uri";
/// Metadata key of the file name without its extension.
pub const KEY_BASENAME: &str = "basename";
/// Metadata key of the file extension, without the dot.
pub const KEY_EXTENSION: &str = "extension";
/// Metadata key of the file name including its extension.
pub const KEY_FILENAME: &str = "filename";
/// Metadata key of the absolute file path, empty for non-file sources.
pub const KEY_FILEPATH: &str = "filepath";
/// Metadata key of the path relative to the enumeration root.
pub const KEY_RELATIVE_FILE_PATH: &str = "relativeFilePath";
/// Metadata key of the content type.
pub const KEY_MIME_TYPE: &str = "mimeType";
/// Metadata key of the charset name.
pub const KEY_CHARSET: &str = "charset";

/// Every metadata key a data source answers to.
pub const METADATA_KEYS: [&str; 10] = [
    KEY_NAME,
    KEY_GROUP,
    KEY_URI,
    KEY_BASENAME,
    KEY_EXTENSION,
    KEY_FILENAME,
    KEY_FILEPATH,
    KEY_RELATIVE_FILE_PATH,
    KEY_MIME_TYPE,
    KEY_CHARSET,
];

/// One resolved content unit.
///
/// `name` is never empty and `uri` always points at something that can be
/// opened, even if it yields zero bytes.
pub struct DataSource {
    name: String,
    group: String,
    uri: String,
    content_type: Option<String>,
    charset: &'static Encoding,
    relative_file_path: String,
    content: Content,
    resources: ResourceRegistry,
}

impl DataSource {
    /// Starts building a data source for `uri` backed by `content`.
    pub fn builder(uri: impl Into<String>, content: Content) -> DataSourceBuilder {
        DataSourceBuilder {
            name: None,
            group: None,
            uri: uri.into(),
            content_type: None,
            charset: encoding_rs::UTF_8,
            relative_file_path: String::new(),
            content,
        }
    }

    /// A data source for an existing regular file, named by its path.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::FileNotFound`] if `path` is not a regular file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataSourceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let absolute = std::path::absolute(path)?;
        Ok(Self::builder(file_uri(&absolute), Content::file(absolute))
            .name(path.display().to_string())
            .build())
    }

    /// An in-memory text data source.
    pub fn from_string(name: &str, text: impl Into<String>) -> Self {
        Self::builder(format!("string:///{name}"), Content::text(text))
            .name(name)
            .content_type(MIME_TEXT_PLAIN)
            .build()
    }

    /// An in-memory binary data source.
    pub fn from_bytes(name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self::builder(format!("bytes:///{name}"), Content::bytes(bytes)).name(name).build()
    }

    /// A data source fetched from `url` on first read, named by the URL.
    pub fn from_http(url: &str, client: Client) -> Self {
        Self::builder(url, Content::http(url, client)).name(url).build()
    }

    /// Display name, unique only by convention.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Canonical absolute URI of the content.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Charset used by [`text`](Self::text), [`lines`](Self::lines) and
    /// [`line_iterator`](Self::line_iterator).
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    /// Path relative to the directory the file was found under, empty when
    /// the source was not resolved from a directory.
    pub fn relative_file_path(&self) -> &str {
        &self.relative_file_path
    }

    /// Backing file, for file-backed sources.
    pub fn file(&self) -> Option<&Path> {
        self.content.path()
    }

    /// Content type: the explicit one if set, otherwise derived from the content.
    ///
    /// For HTTP sources without an explicit type this fetches the body. A
    /// failed fetch is logged and reported as `application/octet-stream`; the
    /// error itself surfaces on the next content read.
    pub fn content_type(&self) -> String {
        if let Some(content_type) = &self.content_type {
            return content_type.clone();
        }
        match self.content.derived_content_type() {
            Ok(Some(content_type)) => content_type,
            Ok(None) => content::fallback_content_type(),
            Err(e) => {
                warn!("Could not determine content type of '{}': {}", self.name, e);
                content::fallback_content_type()
            }
        }
    }

    /// A single metadata value, `None` for unknown keys.
    pub fn metadata(&self, key: &str) -> Option<String> {
        let value = match key {
            KEY_NAME => self.name.clone(),
            KEY_GROUP => self.group.clone(),
            KEY_URI => self.uri.clone(),
            KEY_BASENAME => self.segment_part(Path::file_stem),
            KEY_EXTENSION => self.segment_part(Path::extension),
            KEY_FILENAME => self.last_segment(),
            KEY_FILEPATH => {
                self.content.path().map(|p| p.display().to_string()).unwrap_or_default()
            }
            KEY_RELATIVE_FILE_PATH => self.relative_file_path.clone(),
            KEY_MIME_TYPE => self.content_type(),
            KEY_CHARSET => self.charset.name().to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// All metadata, keyed by [`METADATA_KEYS`].
    pub fn metadata_map(&self) -> BTreeMap<String, String> {
        METADATA_KEYS
            .iter()
            .filter_map(|key| self.metadata(key).map(|value| (key.to_string(), value)))
            .collect()
    }

    fn last_segment(&self) -> String {
        if let Some(path) = self.content.path() {
            return path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        }
        Url::parse(&self.uri)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .unwrap_or_default()
    }

    fn segment_part(&self, part: fn(&Path) -> Option<&std::ffi::OsStr>) -> String {
        let segment = self.last_segment();
        part(Path::new(&segment)).map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Length in bytes without reading the content.
    ///
    /// File sources report their size on disk, in-memory sources their buffer
    /// length. `None` means unknown, which is the case for HTTP sources until
    /// the body has been fetched.
    pub fn length(&self) -> Result<Option<u64>> {
        self.ensure_open()?;
        Ok(self.content.length())
    }

    /// Whole content as bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let mut bytes = Vec::new();
        self.content.open()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Whole content decoded with the data source charset.
    pub fn text(&self) -> Result<String> {
        self.text_with(self.charset)
    }

    /// Whole content decoded with `charset`. A byte order mark, if present,
    /// takes precedence.
    pub fn text_with(&self, charset: &'static Encoding) -> Result<String> {
        let bytes = self.bytes()?;
        let (text, used, had_errors) = charset.decode(&bytes);
        if had_errors {
            debug!("Replaced malformed {} sequences in '{}'", used.name(), self.name);
        }
        Ok(text.into_owned())
    }

    /// Content split into lines, terminators removed.
    pub fn lines(&self) -> Result<Vec<String>> {
        Ok(self.text()?.lines().map(str::to_string).collect())
    }

    /// Lazily decoded lines, released when the data source closes.
    pub fn line_iterator(&self) -> Result<LineIterator> {
        Ok(LineIterator::new(self.input_stream()?, self.charset))
    }

    /// A fresh byte stream, released when the data source closes.
    pub fn input_stream(&self) -> Result<TrackedReader> {
        self.ensure_open()?;
        let reader = self.content.open()?;
        Ok(TrackedReader::track(reader, &self.resources))
    }

    /// A fresh byte stream the caller is responsible for dropping.
    pub fn untracked_input_stream(&self) -> Result<Box<dyn Read + Send>> {
        self.ensure_open()?;
        self.content.open()
    }

    /// Binds a caller resource to this data source; `release` runs on close.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::ClosedResource`] if the data source is
    /// already closed. `release` has run by then.
    pub fn register<F>(&self, release: F) -> Result<()>
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        if self.resources.register(release) {
            Ok(())
        } else {
            Err(self.closed_error())
        }
    }

    /// Releases every tracked stream and registered resource.
    ///
    /// Idempotent. Every release runs even if an earlier one fails; the first
    /// failure is returned.
    pub fn close(&self) -> Result<()> {
        if !self.resources.is_closed() {
            debug!("Closing data source '{}' ({} resource(s))", self.name, self.resources.pending());
        }
        self.resources.close()?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.resources.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    fn closed_error(&self) -> DataSourceError {
        DataSourceError::ClosedResource {
            name: self.name.clone(),
        }
    }
}

impl Drop for DataSource {
    fn drop(&mut self) {
        // Failures are already logged by the registry
        let _ = self.resources.close();
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("uri", &self.uri)
            .field("charset", &self.charset.name())
            .field("relative_file_path", &self.relative_file_path)
            .field("content", &self.content)
            .field("resources", &self.resources)
            .finish()
    }
}

/// Builder for [`DataSource`], used by the loaders.
pub struct DataSourceBuilder {
    name: Option<String>,
    group: Option<String>,
    uri: String,
    content_type: Option<String>,
    charset: &'static Encoding,
    relative_file_path: String,
    content: Content,
}

impl DataSourceBuilder {
    /// Display name. Blank names are ignored and the URI is used instead.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Group. Blank groups are ignored and the default group is used instead.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Explicit content type, overriding whatever the content would derive.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn charset(mut self, charset: &'static Encoding) -> Self {
        self.charset = charset;
        self
    }

    pub fn relative_file_path(mut self, relative_file_path: impl Into<String>) -> Self {
        self.relative_file_path = relative_file_path.into();
        self
    }

    pub fn build(self) -> DataSource {
        let name = non_blank(self.name).unwrap_or_else(|| self.uri.clone());
        let group = non_blank(self.group).unwrap_or_else(|| DEFAULT_GROUP.to_string());
        DataSource {
            name,
            group,
            uri: self.uri,
            content_type: non_blank(self.content_type),
            charset: self.charset,
            relative_file_path: self.relative_file_path,
            content: self.content,
            resources: ResourceRegistry::new(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `file://` URI of an absolute path.
pub(crate) fn file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}

/// Absolute form of `path`, relative paths taken against the working directory.
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
