//! The `list` command: show what references resolve to.
//!
//! # Output Formats
//!
//! - `table` (default): name, group, mime type, length and uri
//! - `json`: an array of metadata objects, one per data source
//! - `simple`: one name per line
//!
//! # Examples
//!
//! ```bash
//! tmplgen list ./src/test/data
//! tmplgen list --find '*.csv' --format json data=./src/test/data
//! tmplgen list --group-by extension ./docs
//! ```

mod formatters;

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

use super::common::{ResolveArgs, with_collection};
use crate::datasource::DataSourceCollection;
use formatters::{ListItem, OutputConfig, render_groups, render_items};

/// List the data sources the references resolve to.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output format: table, json or simple
    #[arg(short = 'f', long, default_value = "table")]
    format: String,

    /// Only show data sources whose name matches this glob ('!' negates)
    #[arg(long, value_name = "PATTERN")]
    find: Option<String>,

    /// Only show data sources in this group
    #[arg(long, value_name = "GROUP")]
    group: Option<String>,

    /// Partition the output by a metadata key (name, group, extension, mimeType, ...)
    #[arg(long, value_name = "KEY")]
    group_by: Option<String>,

    #[command(flatten)]
    resolve: ResolveArgs,
}

impl ListCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        if !matches!(self.format.as_str(), "table" | "json" | "simple") {
            bail!("Unknown format '{}'; expected table, json or simple", self.format);
        }

        let config = self.resolve.resolver_config(config_path)?;
        let collection = self.resolve.resolve(&config)?;

        let output = with_collection(collection, |collection| self.render(collection))?;
        print!("{output}");
        Ok(())
    }

    fn render(&self, collection: &DataSourceCollection) -> Result<String> {
        let mut selected = collection.clone();
        if let Some(pattern) = &self.find {
            selected = selected.find(pattern)?;
        }
        if let Some(group) = &self.group {
            selected = selected.by_group(group);
        }

        let config = OutputConfig {
            format: self.format.clone(),
            ..OutputConfig::default()
        };

        match &self.group_by {
            None => render_items(&ListItem::from_collection(&selected)?, &config),
            Some(key) => {
                let groups = selected
                    .group_by(key)?
                    .into_iter()
                    .map(|(value, partition)| -> Result<(String, Vec<ListItem>)> {
                        Ok((value, ListItem::from_collection(&partition)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                render_groups(key, &groups, &config)
            }
        }
    }
}
