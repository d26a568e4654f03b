//! Core types for tmplgen
//!
//! This module holds the error taxonomy shared by every layer of the
//! resolution pipeline:
//! - [`DataSourceError`] - typed failures returned by parsing, loading,
//!   enumeration and collection queries
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - converts an [`anyhow::Error`] for CLI display
//!
//! # Examples
//!
//! ```rust
//! use tmplgen_cli::core::{DataSourceError, user_friendly_error};
//!
//! let error = anyhow::Error::from(DataSourceError::NotFound {
//!     name: "users".to_string(),
//! });
//! let context = user_friendly_error(error);
//! assert!(context.suggestion.is_some());
//! ```

pub mod error;

pub use error::{DataSourceError, ErrorContext, Result, user_friendly_error};
