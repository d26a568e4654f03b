//! Error handling for tmplgen
//!
//! This module provides the typed error taxonomy of the resolution pipeline and
//! the user-friendly reporting used by the CLI. The error system follows two rules:
//! 1. **Strongly-typed errors** for precise handling in library code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`DataSourceError`] - one variant per failure mode of parsing, loading,
//!   enumeration and collection lookup
//! - [`ErrorContext`] - wrapper that adds details and a suggestion for display
//!
//! Library functions return [`Result`], which defaults its error type to
//! [`DataSourceError`]. The CLI works with [`anyhow::Error`] and converts back
//! with [`user_friendly_error`] right before printing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tmplgen_cli::core::{DataSourceError, ErrorContext};
//!
//! let context = ErrorContext::new(DataSourceError::NotFound {
//!     name: "users".to_string(),
//! })
//! .with_suggestion("Run 'tmplgen list' to see the resolved data source names");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Result type used across the resolution pipeline.
pub type Result<T, E = DataSourceError> = std::result::Result<T, E>;

/// The main error type for data source resolution.
///
/// Every failure of the pipeline is unrecoverable at the point where it
/// happens and is propagated to the caller unchanged; nothing is retried or
/// silently skipped.
///
/// # Error Categories
///
/// ## Reference parsing
/// - [`MalformedReference`] - blank input or a grammar violation
/// - [`UnsupportedCharset`] - a `charset` parameter the registry does not know
///
/// ## Loading
/// - [`UnsupportedReference`] - no loader accepts the locator
/// - [`FileNotFound`] - a file reference that is not an existing regular file
/// - [`RootNotFound`] - an enumeration root that does not exist
/// - [`EnvironmentVariableNotFound`] - `env:///NAME` with `NAME` undefined
/// - [`Http`] - transport failure or non-success status
///
/// ## Collection queries
/// - [`NotFound`] / [`AmbiguousName`] - exact lookup by name
/// - [`UnknownMetadataKey`] - grouping or filtering by an unknown key
/// - [`ClosedResource`] - content access after `close()`
///
/// [`MalformedReference`]: DataSourceError::MalformedReference
/// [`UnsupportedCharset`]: DataSourceError::UnsupportedCharset
/// [`UnsupportedReference`]: DataSourceError::UnsupportedReference
/// [`FileNotFound`]: DataSourceError::FileNotFound
/// [`RootNotFound`]: DataSourceError::RootNotFound
/// [`EnvironmentVariableNotFound`]: DataSourceError::EnvironmentVariableNotFound
/// [`Http`]: DataSourceError::Http
/// [`NotFound`]: DataSourceError::NotFound
/// [`AmbiguousName`]: DataSourceError::AmbiguousName
/// [`UnknownMetadataKey`]: DataSourceError::UnknownMetadataKey
/// [`ClosedResource`]: DataSourceError::ClosedResource
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Reference string is blank or violates the named reference grammar
    #[error("Malformed reference '{reference}': {reason}")]
    MalformedReference {
        /// The reference string as supplied
        reference: String,
        /// What is wrong with it
        reason: String,
    },

    /// No loader accepts the locator
    #[error("No loader accepts the reference: {locator}")]
    UnsupportedReference {
        /// The locator that nothing accepted
        locator: String,
    },

    /// Referenced path is not an existing regular file
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was looked up
        path: String,
    },

    /// Enumeration root does not exist
    #[error("Root directory not found: {path}")]
    RootNotFound {
        /// The root that was looked up
        path: String,
    },

    /// `env:///NAME` points at an undefined variable
    #[error("Environment variable '{name}' is not defined")]
    EnvironmentVariableNotFound {
        /// Name of the missing variable
        name: String,
    },

    /// Charset name is unknown to the charset registry
    #[error("Unsupported charset: {charset}")]
    UnsupportedCharset {
        /// The charset label as supplied
        charset: String,
    },

    /// Exact lookup matched no data source
    #[error("Data source '{name}' not found")]
    NotFound {
        /// The name that was looked up
        name: String,
    },

    /// Exact lookup matched more than one data source
    #[error("Data source name '{name}' is ambiguous: {count} data sources share it")]
    AmbiguousName {
        /// The name that was looked up
        name: String,
        /// How many data sources carry it
        count: usize,
    },

    /// Content was requested from a data source that has been closed
    #[error("Data source '{name}' has already been closed")]
    ClosedResource {
        /// Name of the closed data source
        name: String,
    },

    /// Glob pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as supplied
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Metadata key is not one of the known fields
    #[error("Unknown metadata key: {key}")]
    UnknownMetadataKey {
        /// The key as supplied
        key: String,
    },

    /// HTTP fetch failed
    #[error("HTTP request to {url} failed: {reason}")]
    Http {
        /// The requested URL
        url: String,
        /// Transport error or status line
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for DataSourceError {
    fn clone(&self) -> Self {
        match self {
            Self::MalformedReference {
                reference,
                reason,
            } => Self::MalformedReference {
                reference: reference.clone(),
                reason: reason.clone(),
            },
            Self::UnsupportedReference {
                locator,
            } => Self::UnsupportedReference {
                locator: locator.clone(),
            },
            Self::FileNotFound {
                path,
            } => Self::FileNotFound {
                path: path.clone(),
            },
            Self::RootNotFound {
                path,
            } => Self::RootNotFound {
                path: path.clone(),
            },
            Self::EnvironmentVariableNotFound {
                name,
            } => Self::EnvironmentVariableNotFound {
                name: name.clone(),
            },
            Self::UnsupportedCharset {
                charset,
            } => Self::UnsupportedCharset {
                charset: charset.clone(),
            },
            Self::NotFound {
                name,
            } => Self::NotFound {
                name: name.clone(),
            },
            Self::AmbiguousName {
                name,
                count,
            } => Self::AmbiguousName {
                name: name.clone(),
                count: *count,
            },
            Self::ClosedResource {
                name,
            } => Self::ClosedResource {
                name: name.clone(),
            },
            Self::InvalidPattern {
                pattern,
                reason,
            } => Self::InvalidPattern {
                pattern: pattern.clone(),
                reason: reason.clone(),
            },
            Self::UnknownMetadataKey {
                key,
            } => Self::UnknownMetadataKey {
                key: key.clone(),
            },
            Self::Http {
                url,
                reason,
            } => Self::Http {
                url: url.clone(),
                reason: reason.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DataSourceError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DataSourceError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`DataSourceError`] anywhere in the chain, template errors from
/// Tera, and plain [`std::io::Error`]s. Everything else is reported with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(ds_error) = error.chain().find_map(|e| e.downcast_ref::<DataSourceError>()) {
        let context = create_error_context(ds_error.clone());
        // Keep the outer anyhow context (e.g. "Failed to resolve data sources")
        if error.downcast_ref::<DataSourceError>().is_none() && context.details.is_none() {
            return context.with_details(error.to_string());
        }
        return context;
    }

    if let Some(tera_error) = error.chain().find_map(|e| e.downcast_ref::<tera::Error>()) {
        let mut message = tera_error.to_string();
        let mut source = std::error::Error::source(tera_error);
        while let Some(cause) = source {
            message.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        return ErrorContext::new(DataSourceError::Other {
            message,
        })
        .with_suggestion(
            "Check template syntax: variables use {{ var }}, control flow uses {% %}. \
             Data sources are available as `data_sources`, data model keys at top level",
        )
        .with_details("The template engine could not render the template");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(DataSourceError::Other {
                message: error.to_string(),
            })
            .with_suggestion("Check file ownership and permissions")
            .with_details("tmplgen does not have permission to read or write a file");
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DataSourceError::Other {
        message,
    })
}

fn create_error_context(error: DataSourceError) -> ErrorContext {
    match &error {
        DataSourceError::MalformedReference { .. } => ErrorContext::new(error)
            .with_suggestion("References use the form [name[:group]=]locator[#key=value&key=value]")
            .with_details("Examples: 'users=data/users.csv', 'cfg:settings=env:///', 'page=https://example.com#mimetype=text/html'"),

        DataSourceError::UnsupportedReference { .. } => ErrorContext::new(error)
            .with_suggestion("Use a file path, a file://, http://, https:// or env:// locator"),

        DataSourceError::FileNotFound { path } => {
            let suggestion = format!("Check that '{path}' exists and is a regular file");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Relative paths are resolved against the current working directory")
        }

        DataSourceError::RootNotFound { path } => {
            let suggestion = format!("Check that the directory '{path}' exists");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        DataSourceError::EnvironmentVariableNotFound { name } => {
            let suggestion = format!("Export '{name}' before running, or use 'env:///' to load all variables");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        DataSourceError::UnsupportedCharset { .. } => ErrorContext::new(error)
            .with_suggestion("Use a WHATWG encoding label such as UTF-8, UTF-16LE, ISO-8859-1 or windows-1252"),

        DataSourceError::NotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'tmplgen list' to see the resolved data source names"),

        DataSourceError::AmbiguousName { .. } => ErrorContext::new(error)
            .with_suggestion("Give the references distinct names with 'name=locator', or query with find()")
            .with_details("Duplicate names may coexist in a collection but exact lookup requires a unique match"),

        DataSourceError::UnknownMetadataKey { .. } => ErrorContext::new(error).with_suggestion(
            "Known keys: name, group, uri, basename, extension, filename, filepath, relativeFilePath, mimeType, charset",
        ),

        DataSourceError::Http { .. } => ErrorContext::new(error)
            .with_suggestion("Check the URL and your network connection")
            .with_details("HTTP content is fetched on first read, not while resolving references"),

        _ => ErrorContext::new(error),
    }
}
