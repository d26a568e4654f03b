//! Test utilities for tmplgen
//!
//! Helpers shared by the unit tests and the integration tests (through the
//! `test-utils` feature): test logging and a builder for temporary directory
//! trees to resolve references against.
//!
//! # Example
//!
//! ```rust,no_run
//! use tmplgen_cli::test_utils::TestTree;
//!
//! let tree = TestTree::builder()
//!     .with_file("pom.xml", "<project/>")
//!     .with_file("src/test/data/users.csv", "alice\nbob\n")
//!     .build()
//!     .unwrap();
//!
//! let reference = format!("data={}", tree.path("src/test/data").display());
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once, no matter how often it is called.
/// Uses the provided level, or `RUST_LOG` when no level is given. Without
/// either, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A temporary directory populated with files, removed on drop.
pub struct TestTree {
    temp_dir: TempDir,
}

impl TestTree {
    /// Create a builder for a new tree
    pub fn builder() -> TestTreeBuilder {
        TestTreeBuilder::default()
    }

    /// Root of the tree
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the tree
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Write (or overwrite) a file after the tree was built
    pub fn write(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.path(relative);
        write_file(&path, content.as_ref())?;
        Ok(path)
    }
}

/// A builder for [`TestTree`] with a fluent API
#[derive(Default)]
pub struct TestTreeBuilder {
    files: Vec<(String, Vec<u8>)>,
    dirs: Vec<String>,
}

impl TestTreeBuilder {
    /// Add a file; parent directories are created as needed
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Add several text files
    pub fn with_files(mut self, files: &[(&str, &str)]) -> Self {
        for (path, content) in files {
            self.files.push(((*path).to_string(), content.as_bytes().to_vec()));
        }
        self
    }

    /// Add an empty directory
    pub fn with_dir(mut self, path: impl Into<String>) -> Self {
        self.dirs.push(path.into());
        self
    }

    /// Create the directory and write every file
    pub fn build(self) -> Result<TestTree> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;

        for dir in &self.dirs {
            let path = temp_dir.path().join(dir);
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        for (relative, content) in &self.files {
            write_file(&temp_dir.path().join(relative), content)?;
        }

        Ok(TestTree {
            temp_dir,
        })
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
