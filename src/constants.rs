//! Global constants used throughout the tmplgen codebase.
//!
//! Defaults that the resolver falls back to live here so they are easy to
//! find, but none of them is read implicitly: callers pass them through
//! [`ResolverConfig`](crate::config::ResolverConfig).

use std::time::Duration;

/// Group assigned to data sources whose reference does not name one.
pub const DEFAULT_GROUP: &str = "default";

/// Charset label used when a reference carries no `charset` parameter.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Name of the synthetic data source built from standard input.
pub const STDIN_NAME: &str = "stdin";

/// URI of the synthetic data source built from standard input.
pub const STDIN_URI: &str = "stdin:///";

/// Content type used when nothing better can be derived.
pub const MIME_APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Content type of environment-backed and stdin data sources.
pub const MIME_TEXT_PLAIN: &str = "text/plain";

/// Default timeout for HTTP fetches (30 seconds).
///
/// Applies to the whole request including reading the body.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default timeout for HTTP fetches as a [`Duration`].
pub fn default_http_timeout() -> Duration {
    Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
}

/// Marker that separates a locator scheme from the rest of the URI.
pub const SCHEME_SEPARATOR: &str = "://";
