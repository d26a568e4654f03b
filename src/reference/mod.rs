//! Named references: the `[name[:group]=]locator[#key=value&...]` syntax.
//!
//! A named reference attaches an optional logical name, an optional group and
//! optional key/value parameters to any file path or URI. It is the unit the
//! user supplies on the command line; the [`resolver`](crate::resolver) turns
//! each one into one or more [`DataSource`](crate::datasource::DataSource)s.
//!
//! # Syntax
//!
//! ```text
//! users=data/users.csv                      name "users", file locator
//! users:csv=data/users.csv                  name "users", group "csv"
//! config=env:///                            all environment variables
//! pwd=env:///PWD                            a single variable
//! page=https://example.com/#mimetype=text/html
//! data/users.csv#charset=ISO-8859-1         unnamed, with a charset
//! ```
//!
//! Recognized parameters are `charset` and `mimeType` / `mimetype`; any other
//! parameter is kept and can be read with [`NamedReference::parameter`].
//!
//! # Examples
//!
//! ```rust
//! use tmplgen_cli::reference::NamedReference;
//!
//! let reference = NamedReference::parse("users:csv=file:///users.csv#charset=UTF-16")?;
//! assert_eq!(reference.name(), Some("users"));
//! assert_eq!(reference.group(), Some("csv"));
//! assert_eq!(reference.target(), "file:///users.csv");
//! assert_eq!(reference.parameter("charset"), Some("UTF-16"));
//! # Ok::<(), tmplgen_cli::core::DataSourceError>(())
//! ```

mod parser;

pub use parser::parse;

use encoding_rs::Encoding;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::constants::SCHEME_SEPARATOR;
use crate::core::{DataSourceError, Result};

/// Parameter key selecting the charset used to decode text.
pub const PARAM_CHARSET: &str = "charset";

/// Parameter keys overriding the derived content type.
pub const PARAM_MIME_TYPE: [&str; 2] = ["mimeType", "mimetype"];

static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*)://").expect("scheme regex is valid")
});

/// An immutable, parsed named reference.
///
/// `locator` keeps the text exactly as written after the name part, including
/// any fragment, so `http://google.com#charset=UTF-16` stays intact.
/// [`target`](Self::target) is the same text without a parameter-shaped
/// fragment and is what loaders actually open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedReference {
    name: Option<String>,
    group: Option<String>,
    locator: String,
    target: String,
    parameters: BTreeMap<String, String>,
}

impl NamedReference {
    /// Parses a reference string. See [`parse`].
    pub fn parse(input: &str) -> Result<Self> {
        parser::parse(input)
    }

    pub(crate) fn from_parts(
        name: Option<String>,
        group: Option<String>,
        locator: String,
        target: String,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name,
            group,
            locator,
            target,
            parameters,
        }
    }

    /// Logical name, `None` when the reference carries none.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Group, `None` when the reference carries none.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Locator as written, fragment included.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Locator without the parameter fragment.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// All fragment parameters, keyed case-sensitively.
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// A single fragment parameter.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Lower-cased scheme of the locator (`http`, `file`, `env`, ...), if any.
    ///
    /// Only `scheme://` counts as a scheme, so Windows drive letters such as
    /// `C:/data` are plain paths.
    pub fn scheme(&self) -> Option<String> {
        SCHEME.captures(&self.target).map(|c| c[1].to_ascii_lowercase())
    }

    /// Returns true if the locator has no scheme or the `file` scheme.
    pub fn is_file(&self) -> bool {
        matches!(self.scheme().as_deref(), None | Some("file"))
    }

    /// Filesystem path of a file locator, `None` for any other scheme.
    pub fn file(&self) -> Option<PathBuf> {
        match self.scheme().as_deref() {
            None => Some(PathBuf::from(&self.target)),
            Some("file") => Url::parse(&self.target)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .or_else(|| {
                    // file://./relative/path has a host and no valid file path
                    let rest = &self.target[self.target.find(SCHEME_SEPARATOR)? + 3..];
                    Some(PathBuf::from(rest))
                }),
            Some(_) => None,
        }
    }

    /// Charset requested by the `charset` parameter, or `default`.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::UnsupportedCharset`] when the parameter names
    /// no known charset.
    pub fn charset(&self, default: &'static Encoding) -> Result<&'static Encoding> {
        match self.parameter(PARAM_CHARSET) {
            Some(label) => lookup_charset(label),
            None => Ok(default),
        }
    }

    /// Content type requested by `mimeType` / `mimetype`, if any.
    pub fn mime_type(&self) -> Option<&str> {
        PARAM_MIME_TYPE.iter().find_map(|key| self.parameter(key))
    }
}

impl fmt::Display for NamedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.group) {
            (Some(name), Some(group)) => write!(f, "{name}:{group}=")?,
            (Some(name), None) => write!(f, "{name}=")?,
            (None, Some(group)) => write!(f, ":{group}=")?,
            (None, None) => {}
        }
        write!(f, "{}", self.locator)
    }
}

/// Looks up a charset by label in the WHATWG encoding registry.
///
/// # Errors
///
/// Returns [`DataSourceError::UnsupportedCharset`] for unknown labels.
pub fn lookup_charset(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| DataSourceError::UnsupportedCharset {
        charset: label.to_string(),
    })
}
