//! The `render` command.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use super::common::{ResolveArgs, with_collection};
use crate::templating::TemplateRenderer;

/// Render a Tera template with the resolved data sources.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template file to render
    #[arg(short, long, value_name = "FILE")]
    template: PathBuf,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Data model entry available at the top level of the template (repeatable)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    #[command(flatten)]
    resolve: ResolveArgs,
}

impl RenderCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let template = std::fs::read_to_string(&self.template)
            .with_context(|| format!("Failed to read template {}", self.template.display()))?;
        let data_model: BTreeMap<String, String> = self.params.into_iter().collect();

        let config = self.resolve.resolver_config(config_path)?;
        let collection = self.resolve.resolve(&config)?;

        let rendered = with_collection(collection, |collection| {
            TemplateRenderer::new().render(&template, collection, &data_model)
        })
        .with_context(|| format!("Failed to render {}", self.template.display()))?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} byte(s) to {}", rendered.len(), path.display());
            }
            None => print!("{rendered}"),
        }
        Ok(())
    }
}

fn parse_key_value(input: &str) -> Result<(String, String)> {
    let (key, value) =
        input.split_once('=').ok_or_else(|| anyhow!("expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("empty key in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
