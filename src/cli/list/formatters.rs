use anyhow::Result;
use colored::Colorize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::datasource::{DataSource, DataSourceCollection};

/// Configuration for output formatting options
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub title: String,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            title: "Data Sources".to_string(),
            format: "table".to_string(),
        }
    }
}

/// One listed data source.
#[derive(Debug, Clone)]
pub struct ListItem {
    pub name: String,
    pub group: String,
    pub mime_type: String,
    /// `None` while unknown, e.g. for HTTP content that has not been fetched
    pub length: Option<u64>,
    pub uri: String,
    pub metadata: BTreeMap<String, String>,
}

impl ListItem {
    pub fn from_data_source(data_source: &DataSource) -> Result<Self> {
        let metadata = data_source.metadata_map();
        Ok(Self {
            name: data_source.name().to_string(),
            group: data_source.group().to_string(),
            mime_type: data_source.content_type(),
            length: data_source.length()?,
            uri: data_source.uri().to_string(),
            metadata,
        })
    }

    pub fn from_collection(collection: &DataSourceCollection) -> Result<Vec<Self>> {
        collection.iter().map(|ds| Self::from_data_source(ds)).collect()
    }

    fn to_json(&self) -> Value {
        let mut object: Map<String, Value> =
            self.metadata.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
        object.insert("length".to_string(), self.length.map_or(Value::Null, Value::from));
        Value::Object(object)
    }
}

/// Renders items in the configured format.
pub fn render_items(items: &[ListItem], config: &OutputConfig) -> Result<String> {
    match config.format.as_str() {
        "json" => render_json(items),
        "simple" => Ok(render_simple(items)),
        _ => Ok(render_table(items, &config.title)),
    }
}

/// Renders partitions keyed by the value of metadata `key`.
pub fn render_groups(
    key: &str,
    groups: &[(String, Vec<ListItem>)],
    config: &OutputConfig,
) -> Result<String> {
    if config.format == "json" {
        let object: Map<String, Value> = groups
            .iter()
            .map(|(value, items)| {
                (value.clone(), Value::Array(items.iter().map(ListItem::to_json).collect()))
            })
            .collect();
        return Ok(format!("{}\n", serde_json::to_string_pretty(&object)?));
    }

    let mut output = String::new();
    for (value, items) in groups {
        let value = if value.is_empty() { "(none)" } else { value.as_str() };
        let title = format!("{key}: {value}");
        if config.format == "simple" {
            let _ = writeln!(output, "{title}");
            output.push_str(&render_simple(items));
        } else {
            output.push_str(&render_table(items, &title));
            output.push('\n');
        }
    }
    Ok(output)
}

fn render_json(items: &[ListItem]) -> Result<String> {
    let values: Vec<Value> = items.iter().map(ListItem::to_json).collect();
    Ok(format!("{}\n", serde_json::to_string_pretty(&values)?))
}

fn render_simple(items: &[ListItem]) -> String {
    items.iter().map(|item| format!("{}\n", item.name)).collect()
}

fn render_table(items: &[ListItem], title: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", title.bold());

    if items.is_empty() {
        let _ = writeln!(output, "No data sources found.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<32} {:<12} {:<24} {:>10}  {}",
        "Name".cyan().bold(),
        "Group".cyan().bold(),
        "Type".cyan().bold(),
        "Length".cyan().bold(),
        "URI".cyan().bold()
    );
    let _ = writeln!(output, "{}", "-".repeat(100).bright_black());

    for item in items {
        let length = item.length.map_or_else(|| "?".to_string(), |l| l.to_string());
        let _ = writeln!(
            output,
            "{:<32} {:<12} {:<24} {:>10}  {}",
            item.name.bright_white(),
            item.group.yellow(),
            item.mime_type,
            length,
            item.uri.bright_black()
        );
    }
    output
}
