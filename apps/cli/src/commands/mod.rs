//! Subcommand handlers.
//!
//! Handlers print progress and a final tally on stdout, log through
//! `tracing`, and report success through the returned exit code.

pub mod audio;
pub mod build;
pub mod insert;
pub mod metadata;
pub mod tracking;
pub mod unpack;
pub mod validate;

use anyhow::Context;
use chrono::Local;
use std::path::Path;

pub(crate) fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Local date as written into the markdown files.
pub(crate) fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub(crate) fn rule() {
    println!("{}", "=".repeat(70));
}
