//! Command-line interface for tmplgen.
//!
//! # Commands
//!
//! - `render` - resolve references and render a Tera template with them
//! - `list` - resolve references and show what they resolved to
//!
//! Both commands take the same reference arguments and resolver options (see
//! [`ResolveArgs`]) and close every data source before returning, whether or
//! not the command succeeded.
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - no logging at all
//! - `--config <FILE>` - resolver configuration file instead of
//!   `~/.tmplgen/config.toml`
//!
//! Without either flag, `RUST_LOG` is honored and falls back to `warn`.
//!
//! # Examples
//!
//! ```bash
//! # Render a report from a CSV file, a directory and an environment variable
//! tmplgen render --template report.tera users=data/users.csv docs=./docs home=env:///HOME
//!
//! # Only XML files, rendered to a file
//! tmplgen render -t pom.tera --include '*.xml' -o out.txt pom.xml README.md ./src/test/data
//!
//! # Show what a set of references resolves to
//! tmplgen list --format json ./src/test/data
//! ```

mod common;
mod list;
mod render;

pub use common::ResolveArgs;
pub use list::ListCommand;
pub use render::RenderCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags, applied once before a command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the log subscriber; `None` disables logging.
    pub log_level: Option<String>,

    /// Resolver configuration file given with `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the stderr log subscriber.
    ///
    /// Does nothing when logging is disabled or a subscriber is already set.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Resolve named references into data sources and render templates with them.
#[derive(Parser)]
#[command(
    name = "tmplgen",
    about = "Render templates from files, directories, URLs and environment variables",
    version,
    long_about = "tmplgen resolves named references such as users=data/users.csv, \
                  ./docs, https://example.com/data.json or env:///HOME into data \
                  sources and renders a Tera template with them."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Resolver configuration file (default: ~/.tmplgen/config.toml)
    #[arg(long, global = true, value_name = "FILE", env = "TMPLGEN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with the resolved data sources
    Render(RenderCommand),

    /// List the data sources the references resolve to
    List(ListCommand),
}

impl Cli {
    /// Runs the parsed command.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Translates the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Runs the parsed command with an explicit configuration.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute(config.config_path),
            Commands::List(cmd) => cmd.execute(config.config_path),
        }
    }
}
