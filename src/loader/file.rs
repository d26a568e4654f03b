//! Regular files as data sources.

use std::path::Path;
use tracing::debug;

use super::{LoadDefaults, source_group, source_name};
use crate::core::{DataSourceError, Result};
use crate::datasource::{self, Content, DataSource};
use crate::reference::NamedReference;

/// Loader for bare paths and `file://` locators.
///
/// Accepts every reference without a scheme, so it has to come last in the
/// dispatch order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    pub fn accepts(&self, reference: &NamedReference) -> bool {
        reference.is_file()
    }

    /// Creates a data source for the referenced file.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::FileNotFound`] if the path is not an existing
    /// regular file.
    pub fn load(&self, reference: &NamedReference, defaults: LoadDefaults<'_>) -> Result<DataSource> {
        let path = reference.file().ok_or_else(|| DataSourceError::UnsupportedReference {
            locator: reference.locator().to_string(),
        })?;
        self.load_path(&path, source_name(reference), "", reference, defaults)
    }

    /// Creates a data source for `path` carrying the settings of `reference`.
    ///
    /// Used for files found under a directory reference, where name and
    /// relative path are individual but group, charset and content type come
    /// from the reference.
    pub fn load_path(
        &self,
        path: &Path,
        name: String,
        relative_file_path: &str,
        reference: &NamedReference,
        defaults: LoadDefaults<'_>,
    ) -> Result<DataSource> {
        if !path.is_file() {
            return Err(DataSourceError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let absolute = datasource::absolute_path(path)?;
        let uri = datasource::file_uri(&absolute);
        debug!("Loading file {} as '{}'", absolute.display(), name);

        let mut builder = DataSource::builder(uri, Content::file(absolute))
            .name(name)
            .group(source_group(reference, defaults))
            .charset(reference.charset(defaults.charset)?)
            .relative_file_path(relative_file_path);
        if let Some(mime_type) = reference.mime_type() {
            builder = builder.content_type(mime_type);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_plain_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pom.xml");
        std::fs::write(&path, "<project/>").unwrap();

        let reference = NamedReference::parse(&path.display().to_string()).unwrap();
        let source = FileLoader.load(&reference, LoadDefaults::default()).unwrap();

        assert_eq!(source.name(), reference.target());
        assert_eq!(source.group(), "default");
        assert!(source.uri().starts_with("file://"));
        assert!(source.uri().ends_with("/pom.xml"));
        assert_eq!(source.length().unwrap(), Some(10));
        assert_eq!(source.relative_file_path(), "");
        assert!(source.content_type().ends_with("xml"));
    }

    #[test]
    fn test_load_file_url_with_parameters() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.dat");
        std::fs::write(&path, [0x67, 0x72, 0xFC]).unwrap();

        let url = url::Url::from_file_path(&path).unwrap();
        let input = format!("users:csv={url}#charset=ISO-8859-1&mimeType=text/csv");
        let reference = NamedReference::parse(&input).unwrap();
        let source = FileLoader.load(&reference, LoadDefaults::default()).unwrap();

        assert_eq!(source.name(), "users");
        assert_eq!(source.group(), "csv");
        assert_eq!(source.content_type(), "text/csv");
        assert_eq!(source.text().unwrap(), "grü");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.txt");
        let reference = NamedReference::parse(&path.display().to_string()).unwrap();

        assert!(matches!(
            FileLoader.load(&reference, LoadDefaults::default()),
            Err(DataSourceError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let reference = NamedReference::parse(&temp_dir.path().display().to_string()).unwrap();

        assert!(matches!(
            FileLoader.load(&reference, LoadDefaults::default()),
            Err(DataSourceError::FileNotFound { .. })
        ));
    }
}
