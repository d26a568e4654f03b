//! Tera adapter that renders a template against a resolved collection.
//!
//! Template syntax is entirely Tera's; this module only builds the context.
//!
//! # Template Context
//!
//! - `data_sources`: one object per data source, in collection order, with
//!   every metadata key (`name`, `group`, `uri`, `basename`, `extension`,
//!   `filename`, `filepath`, `relativeFilePath`, `mimeType`, `charset`) plus
//!   `content` (decoded text) and `length` (bytes, `null` when unknown)
//! - `data_source_names`: the names, in collection order
//! - every key of the data model, at top level
//!
//! ```text
//! {% for ds in data_sources %}{{ ds.name }} ({{ ds.mimeType }}){% endfor %}
//! Built by {{ user }}
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tera::{Context as TeraContext, Tera};
use tracing::debug;

use crate::datasource::{DataSource, DataSourceCollection};

/// Context key holding the data source objects.
pub const DATA_SOURCES_KEY: &str = "data_sources";

/// Context key holding the data source names.
pub const DATA_SOURCE_NAMES_KEY: &str = "data_source_names";

/// Renders templates with a fresh Tera instance per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders `template` with the collection and data model in context.
    ///
    /// # Errors
    ///
    /// Returns an error if a data source cannot be read or the template fails
    /// to parse or render.
    pub fn render(
        &self,
        template: &str,
        collection: &DataSourceCollection,
        data_model: &BTreeMap<String, String>,
    ) -> Result<String> {
        let context = self.build_context(collection, data_model)?;

        debug!(
            "Rendering template with {} data source(s) and {} model key(s)",
            collection.len(),
            data_model.len()
        );
        let mut tera = Tera::default();
        tera.render_str(template, &context).map_err(|e| {
            let message = Self::format_tera_error(&e);
            anyhow::Error::new(e).context(message)
        })
    }

    /// Builds the Tera context for a render.
    ///
    /// Reads the content of every data source.
    ///
    /// # Errors
    ///
    /// Returns an error if a data source cannot be read.
    pub fn build_context(
        &self,
        collection: &DataSourceCollection,
        data_model: &BTreeMap<String, String>,
    ) -> Result<TeraContext> {
        let mut context = TeraContext::new();
        for (key, value) in data_model {
            context.insert(key.as_str(), value);
        }

        let data_sources = collection
            .iter()
            .map(|ds| data_source_value(ds))
            .collect::<Result<Vec<_>>>()?;

        context.insert(DATA_SOURCES_KEY, &data_sources);
        context.insert(DATA_SOURCE_NAMES_KEY, &collection.names());
        Ok(context)
    }

    /// Flattens a Tera error chain into one line, without Tera's internal
    /// template names.
    pub fn format_tera_error(error: &tera::Error) -> String {
        use std::error::Error;

        let mut messages = vec![error.to_string()];
        let mut current: Option<&dyn Error> = error.source();
        while let Some(err) = current {
            messages.push(err.to_string());
            current = err.source();
        }

        let cleaned: Vec<String> = messages
            .iter()
            .map(|msg| {
                msg.replace("Failed to render '__tera_one_off'", "")
                    .replace("Failed to parse '__tera_one_off'", "")
                    .replace("'__tera_one_off'", "template")
                    .trim()
                    .to_string()
            })
            .filter(|msg| !msg.is_empty())
            .collect();

        if cleaned.is_empty() {
            "Template syntax error".to_string()
        } else {
            cleaned.join(": ")
        }
    }
}

fn data_source_value(data_source: &DataSource) -> Result<Value> {
    let mut object: Map<String, Value> =
        data_source.metadata_map().into_iter().map(|(k, v)| (k, Value::String(v))).collect();

    let content = data_source
        .text()
        .with_context(|| format!("Failed to read data source '{}'", data_source.name()))?;
    object.insert("content".to_string(), Value::String(content));

    // Known after the read for HTTP sources
    let length = data_source.length()?;
    object.insert("length".to_string(), length.map_or(Value::Null, Value::from));

    Ok(Value::Object(object))
}
