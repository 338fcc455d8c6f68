//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for a throwaway project root with the standard layout
//! - Helpers for placing audio files and reading results back

#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vocab_cli::config::ProjectPaths;

/// Temporary project root.
///
/// The directory is removed when the context is dropped.
pub struct TestContext {
    _dir: TempDir,
    pub paths: ProjectPaths,
}

impl TestContext {
    /// Create an empty project with the audio, flashcards and temp directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let paths = ProjectPaths::new(dir.path());
        for sub in [
            paths.generated_audio(),
            paths.legacy_audio(),
            paths.flashcards().join("scripts"),
            paths.temp_dir(),
            paths.root.join("vocabulary"),
        ] {
            fs::create_dir_all(sub).expect("Failed to create project layout");
        }
        Self { _dir: dir, paths }
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// Write `content` to `path`, creating parents.
    pub fn write(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("Failed to read file")
    }

    /// Place a generated WAV file.
    pub fn add_generated_audio(&self, file_name: &str) -> PathBuf {
        let path = self.paths.generated_audio().join(file_name);
        fs::write(&path, format!("RIFF {file_name}")).expect("Failed to write audio");
        path
    }

    /// Place a legacy MP3 file.
    pub fn add_legacy_audio(&self, file_name: &str) -> PathBuf {
        let path = self.paths.legacy_audio().join(file_name);
        fs::write(&path, format!("ID3 {file_name}")).expect("Failed to write audio");
        path
    }
}

/// Names of all entries in a zip archive.
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("Failed to open package");
    let archive = zip::ZipArchive::new(file).expect("Failed to read package");
    archive.file_names().map(str::to_string).collect()
}

/// Contents of one zip entry as text.
pub fn zip_text(path: &Path, entry: &str) -> String {
    let file = fs::File::open(path).expect("Failed to open package");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read package");
    let mut out = String::new();
    archive
        .by_name(entry)
        .expect("Missing zip entry")
        .read_to_string(&mut out)
        .expect("Failed to read zip entry");
    out
}
