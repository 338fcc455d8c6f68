//! Audio presence lookup across the generated and legacy audio directories.

use crate::config::ProjectPaths;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One directory of audio files with a fixed extension.
#[derive(Debug, Clone)]
pub struct AudioSource {
    pub dir: PathBuf,
    /// Including the dot, e.g. `.wav`.
    pub extension: &'static str,
    pub description: &'static str,
}

/// A word's audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMatch {
    /// Filename as it exists on disk.
    pub file_name: String,
    pub path: PathBuf,
    pub source: &'static str,
}

/// Words with and without audio.
#[derive(Debug, Clone, Default)]
pub struct AudioReport {
    pub found: Vec<(String, String)>,
    pub missing: Vec<String>,
}

/// Looks words up in priority order. Earlier sources win.
#[derive(Debug, Clone)]
pub struct AudioResolver {
    sources: Vec<AudioSource>,
}

/// Filename stems to try, in order, without duplicates.
fn variants(word: &str) -> Vec<String> {
    let mut chars = word.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(4);
    for candidate in [capitalized, word.to_string(), word.to_lowercase(), word.to_uppercase()] {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Case-insensitive scan of one directory. Read errors are logged and count
/// as no match.
fn scan_dir(dir: &Path, word: &str, extension: &str) -> Option<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read audio directory {}: {}", dir.display(), e);
            return None;
        }
    };

    let wanted = word.to_lowercase();
    entries.filter_map(Result::ok).find_map(|entry| {
        let path = entry.path();
        if !path.is_file() {
            return None;
        }
        let name = entry.file_name().into_string().ok()?;
        let stem = path.file_stem()?.to_str()?.to_lowercase();
        (stem == wanted && name.ends_with(extension)).then_some(name)
    })
}

impl AudioResolver {
    pub fn new(sources: Vec<AudioSource>) -> Self {
        Self { sources }
    }

    /// Generated WAV files first, then the legacy MP3 files.
    pub fn for_project(paths: &ProjectPaths) -> Self {
        Self::new(vec![
            AudioSource {
                dir: paths.generated_audio(),
                extension: ".wav",
                description: "Generated (Piper TTS)",
            },
            AudioSource {
                dir: paths.legacy_audio(),
                extension: ".mp3",
                description: "Legacy (Duolingo)",
            },
        ])
    }

    pub fn sources(&self) -> &[AudioSource] {
        &self.sources
    }

    /// Find the audio file for `word`.
    ///
    /// Per source: exact filename variants first (capitalised, verbatim,
    /// lowercase, uppercase), then a case-insensitive directory scan.
    pub fn find(&self, word: &str) -> Option<AudioMatch> {
        if word.is_empty() {
            return None;
        }
        let variants = variants(word);

        for source in &self.sources {
            let exact = variants.iter().find_map(|variant| {
                let file_name = format!("{variant}{}", source.extension);
                source.dir.join(&file_name).is_file().then_some(file_name)
            });
            let found = exact.or_else(|| {
                if source.dir.is_dir() {
                    scan_dir(&source.dir, word, source.extension)
                } else {
                    None
                }
            });
            if let Some(file_name) = found {
                return Some(AudioMatch {
                    path: source.dir.join(&file_name),
                    file_name,
                    source: source.description,
                });
            }
        }
        None
    }

    /// Filename only, for table cells and tracking markers.
    pub fn find_name(&self, word: &str) -> Option<String> {
        self.find(word).map(|m| m.file_name)
    }

    /// Path of an exact filename in the first source directory that has it.
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        self.sources
            .iter()
            .map(|source| source.dir.join(file_name))
            .find(|path| path.is_file())
    }

    pub fn report<S: AsRef<str>>(&self, words: &[S]) -> AudioReport {
        let mut report = AudioReport::default();
        for word in words {
            let word = word.as_ref();
            match self.find_name(word) {
                Some(file) => report.found.push((word.to_string(), file)),
                None => report.missing.push(word.to_string()),
            }
        }
        report
    }
}
