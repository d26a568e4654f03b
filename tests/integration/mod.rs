//! Integration test suite for tmplgen
//!
//! End-to-end tests of the resolution pipeline and the `tmplgen` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: the `render` and `list` commands, exit codes and error output
//! - **environment**: `env://` references
//! - **http**: lazy HTTP content against a local responder
//! - **resolution**: files, directories, filters and collection lookups

mod common;

mod cli;
mod environment;
mod http;
mod resolution;
