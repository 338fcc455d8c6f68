//! Project layout and TTS configuration.
//!
//! Values come from the command line first, then the environment (a `.env`
//! file is loaded at startup), then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vocab_core::DeckKind;

pub const ROOT_ENV: &str = "VOCAB_PROJECT_ROOT";
pub const PYTHON_ENV: &str = "VOCAB_PYTHON";

pub const DEFAULT_MODEL_NAME: &str = "de_DE-thorsten-high";
pub const DEFAULT_LENGTH_SCALE: f32 = 1.5;
pub const WORD_TIMEOUT: Duration = Duration::from_secs(30);
pub const SENTENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration problems found before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project root is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("{what} not found: {path}")]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("could not determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fixed project layout below one root directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `--root`, then `VOCAB_PROJECT_ROOT`, then the current directory.
    pub fn resolve(cli_root: Option<&Path>) -> Result<Self, ConfigError> {
        let root = match cli_root {
            Some(root) => root.to_path_buf(),
            None => match std::env::var_os(ROOT_ENV) {
                Some(root) => PathBuf::from(root),
                None => std::env::current_dir().map_err(ConfigError::CurrentDir)?,
            },
        };
        if !root.is_dir() {
            return Err(ConfigError::MissingRoot(root));
        }
        Ok(Self::new(root))
    }

    pub fn generated_audio(&self) -> PathBuf {
        self.root.join("audio").join("generated_audio")
    }

    pub fn legacy_audio(&self) -> PathBuf {
        self.root.join("audio").join("words_from_duolingo")
    }

    pub fn piper_models(&self) -> PathBuf {
        self.root.join("audio").join("piper_test")
    }

    pub fn flashcards(&self) -> PathBuf {
        self.root.join("flashcards")
    }

    pub fn vocabulary_deck(&self) -> PathBuf {
        self.flashcards().join("german_vocabulary_b1.md")
    }

    pub fn cases_deck(&self) -> PathBuf {
        self.flashcards().join("german_cases_deck.md")
    }

    pub fn word_tracking(&self) -> PathBuf {
        self.flashcards().join("word_tracking.md")
    }

    pub fn pending_cards(&self) -> PathBuf {
        self.flashcards().join("scripts").join("pending_cards.json")
    }

    pub fn cleaned_words(&self) -> PathBuf {
        self.root.join("vocabulary").join("cleaned_german_words.md")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn deck_data(&self) -> PathBuf {
        self.temp_dir().join("deck_data.json")
    }

    pub fn validation_report(&self, timestamp: &str) -> PathBuf {
        self.temp_dir()
            .join(format!("validation_report_{timestamp}.md"))
    }

    /// Markdown source for a deck kind.
    pub fn source_for(&self, kind: DeckKind) -> PathBuf {
        match kind {
            DeckKind::Vocabulary => self.vocabulary_deck(),
            DeckKind::Cases => self.cases_deck(),
        }
    }

    /// Default package path for a deck kind.
    pub fn package_for(&self, kind: DeckKind) -> PathBuf {
        match kind {
            DeckKind::Vocabulary => self.flashcards().join("german_vocabulary_b1.apkg"),
            DeckKind::Cases => self.flashcards().join("german_cases_deck.apkg"),
        }
    }
}

/// Piper invocation settings.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub python: String,
    pub model_dir: PathBuf,
    pub model_name: String,
    pub length_scale: f32,
}

impl TtsConfig {
    /// Defaults for `paths`, with the interpreter taken from `VOCAB_PYTHON`.
    pub fn from_env(paths: &ProjectPaths) -> Self {
        Self {
            python: std::env::var(PYTHON_ENV).unwrap_or_else(|_| "python3".into()),
            model_dir: paths.piper_models(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            length_scale: DEFAULT_LENGTH_SCALE,
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(format!("{}.onnx", self.model_name))
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(format!("{}.onnx.json", self.model_name))
    }

    /// Check that the voice model and its config exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.length_scale.is_finite() && self.length_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "length scale must be positive, got {}",
                self.length_scale
            )));
        }
        let model = self.model_path();
        if !model.is_file() {
            return Err(ConfigError::MissingFile {
                what: "voice model",
                path: model,
            });
        }
        let config = self.config_path();
        if !config.is_file() {
            return Err(ConfigError::MissingFile {
                what: "voice model config",
                path: config,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_relative_to_root() {
        let paths = ProjectPaths::new("/project");
        assert_eq!(
            paths.generated_audio(),
            PathBuf::from("/project/audio/generated_audio")
        );
        assert_eq!(
            paths.source_for(DeckKind::Cases),
            PathBuf::from("/project/flashcards/german_cases_deck.md")
        );
        assert_eq!(
            paths.validation_report("2025-11-08_10-00"),
            PathBuf::from("/project/temp/validation_report_2025-11-08_10-00.md")
        );
    }

    #[test]
    fn resolve_rejects_missing_root() {
        let err = ProjectPaths::resolve(Some(Path::new("/definitely/not/here"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRoot(_)));
    }

    #[test]
    fn tts_validation_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        let config = TtsConfig::from_env(&paths);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("voice model not found"));

        std::fs::create_dir_all(paths.piper_models()).unwrap();
        std::fs::write(config.model_path(), b"onnx").unwrap();
        std::fs::write(config.config_path(), b"{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn tts_validation_rejects_bad_length_scale() {
        let mut config = TtsConfig::from_env(&ProjectPaths::new("/p"));
        config.length_scale = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
