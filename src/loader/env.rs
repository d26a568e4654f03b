//! Environment variables as data sources.
//!
//! `env:///` snapshots every variable of the process as sorted `KEY=value`
//! lines; `env:///NAME` snapshots the value of `NAME`. The snapshot is taken
//! at load time, so later changes to the environment are not seen.
//!
//! The snapshot is stored as UTF-8 whatever charset the reference or the
//! defaults name.

use encoding_rs::UTF_8;
use std::env;
use tracing::debug;

use super::{LoadDefaults, source_group, source_name};
use crate::constants::{MIME_TEXT_PLAIN, SCHEME_SEPARATOR};
use crate::core::{DataSourceError, Result};
use crate::datasource::{Content, DataSource};
use crate::reference::NamedReference;

/// Loader for `env://` locators.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentLoader;

impl EnvironmentLoader {
    pub fn accepts(&self, reference: &NamedReference) -> bool {
        reference.scheme().as_deref() == Some("env")
    }

    /// Snapshots the requested variables into an in-memory data source.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::EnvironmentVariableNotFound`] when a single
    /// variable is requested and it is not defined.
    pub fn load(&self, reference: &NamedReference, defaults: LoadDefaults<'_>) -> Result<DataSource> {
        let variable = variable_name(reference.target());

        let text = match variable {
            "" => all_variables(),
            name => env::var_os(name)
                .map(|value| value.to_string_lossy().into_owned())
                .ok_or_else(|| DataSourceError::EnvironmentVariableNotFound {
                    name: name.to_string(),
                })?,
        };
        debug!("Read {} byte(s) from environment for '{}'", text.len(), reference);

        Ok(DataSource::builder(reference.target(), Content::text(text))
            .name(source_name(reference))
            .group(source_group(reference, defaults))
            .content_type(reference.mime_type().unwrap_or(MIME_TEXT_PLAIN))
            .charset(UTF_8)
            .build())
    }
}

/// `env:///PWD` and `env://PWD` both name `PWD`; `env:///` names nothing.
fn variable_name(target: &str) -> &str {
    let path = target
        .find(SCHEME_SEPARATOR)
        .map_or(target, |index| &target[index + SCHEME_SEPARATOR.len()..]);
    path.trim_matches('/')
}

fn all_variables() -> String {
    let mut variables: Vec<(String, String)> = env::vars_os()
        .map(|(key, value)| {
            (key.to_string_lossy().into_owned(), value.to_string_lossy().into_owned())
        })
        .collect();
    variables.sort();

    variables.iter().map(|(key, value)| format!("{key}={value}\n")).collect()
}
