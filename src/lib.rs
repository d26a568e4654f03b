//! tmplgen - resolve named references into data sources and render templates
//!
//! A named reference is a short string that names a piece of input data and
//! says where to find it:
//!
//! ```text
//! [name[:group]=]locator[#key=value&key=value...]
//! ```
//!
//! ```text
//! pom.xml                               a local file, named by its path
//! users=./data/users.csv#charset=UTF-8  a named local file with a charset
//! docs:site=./docs                      every file below a directory
//! config=https://example.com/c.json     a URL, fetched on first read
//! home=env:///HOME                      one environment variable
//! env=env:///                           all environment variables
//! ```
//!
//! Resolution turns a list of such references into a
//! [`DataSourceCollection`](datasource::DataSourceCollection) whose members
//! load their content lazily and release every stream they handed out when
//! closed.
//!
//! # Modules
//!
//! - [`reference`] - parsing named references
//! - [`pattern`] - glob filters and directory enumeration
//! - [`loader`] - loaders for environment, HTTP and file locators
//! - [`datasource`] - data sources, their content and collections
//! - [`resolver`] - the resolution pipeline tying the above together
//! - [`config`] - resolver defaults from a TOML file
//! - [`templating`] - Tera rendering with a collection as data model
//! - [`cli`] - the `tmplgen` command line
//! - [`core`] - error types and user-facing error context
//!
//! # Example
//!
//! ```rust,no_run
//! use tmplgen_cli::config::ResolverConfig;
//! use tmplgen_cli::resolver;
//!
//! # fn main() -> anyhow::Result<()> {
//! let collection = resolver::resolve(&["pom.xml", "data=./src/test/data"], &ResolverConfig::default())?;
//! for data_source in &collection {
//!     println!("{} ({})", data_source.name(), data_source.content_type());
//! }
//! collection.close()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod datasource;
pub mod loader;
pub mod pattern;
pub mod reference;
pub mod resolver;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
