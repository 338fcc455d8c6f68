//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vocab_core::DeckKind;

#[derive(Parser, Debug)]
#[command(name = "vocab")]
#[command(about = "German vocabulary deck pipeline: markdown tables, Anki packages, audio")]
pub struct Cli {
    /// Project root (default: VOCAB_PROJECT_ROOT, then the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an .apkg package from a markdown card table
    BuildDeck {
        #[arg(long, value_enum, default_value_t = DeckArg::Vocabulary)]
        kind: DeckArg,
        /// Markdown source (default: the deck's file under flashcards/)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Package path (default: next to the source)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Dump every note of an .apkg package as JSON
    Unpack {
        /// Package to read (default: the vocabulary package)
        apkg: Option<PathBuf>,
        /// JSON output (default: temp/deck_data.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare a packaged deck against the markdown source
    Validate {
        /// Previously unpacked deck JSON (default: temp/deck_data.json)
        #[arg(long, conflicts_with = "apkg")]
        deck_json: Option<PathBuf>,
        /// Unpack this package instead of reading JSON
        #[arg(long)]
        apkg: Option<PathBuf>,
        /// Markdown source (default: the vocabulary deck)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Report path (default: temp/validation_report_<timestamp>.md)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Append pending cards to the vocabulary table
    Insert {
        /// Pending cards JSON (default: flashcards/scripts/pending_cards.json)
        #[arg(long)]
        pending: Option<PathBuf>,
        /// Vocabulary table (default: flashcards/german_vocabulary_b1.md)
        #[arg(long)]
        deck: Option<PathBuf>,
        /// Validate and print the rows without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the `Total cards` metadata matches the table
    CheckMetadata {
        #[arg(long)]
        deck: Option<PathBuf>,
        /// Rewrite the metadata when it is out of sync
        #[arg(long)]
        fix: bool,
    },

    /// Word tracking table
    #[command(subcommand)]
    Tracking(TrackingCommand),

    /// Audio generation and availability
    #[command(subcommand)]
    Audio(AudioCommand),
}

#[derive(Subcommand, Debug)]
pub enum TrackingCommand {
    /// Create the tracking table from the cleaned word list
    Create {
        /// Numbered word list (default: vocabulary/cleaned_german_words.md)
        #[arg(long)]
        words: Option<PathBuf>,
        /// Overwrite an existing tracking file
        #[arg(long)]
        force: bool,
    },
    /// Refresh statuses and audio markers in place
    Update,
}

#[derive(Subcommand, Debug)]
pub enum AudioCommand {
    /// Generate word audio with Piper
    Generate {
        #[command(flatten)]
        source: WordSource,
        /// Output directory
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        voice: VoiceArgs,
    },

    /// Generate audio for a sentence
    Sentence {
        #[arg(long)]
        text: String,
        #[arg(long)]
        output_file: PathBuf,
        #[command(flatten)]
        voice: VoiceArgs,
    },

    /// Report which words have audio
    Check {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

/// Exactly one way of naming the words to synthesize.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct WordSource {
    /// A single word
    #[arg(long)]
    pub word: Option<String>,
    /// Several words
    #[arg(long, num_args = 1..)]
    pub words: Vec<String>,
    /// File with one word per line
    #[arg(long)]
    pub input_file: Option<PathBuf>,
}

/// Voice model overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct VoiceArgs {
    /// Directory holding the .onnx model (default: audio/piper_test)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
    #[arg(long)]
    pub model_name: Option<String>,
    /// Speech tempo; larger is slower
    #[arg(long)]
    pub length_scale: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckArg {
    Vocabulary,
    Cases,
}

impl From<DeckArg> for DeckKind {
    fn from(arg: DeckArg) -> Self {
        match arg {
            DeckArg::Vocabulary => DeckKind::Vocabulary,
            DeckArg::Cases => DeckKind::Cases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::parse_from([
            "vocab", "--root", "/p", "audio", "generate", "--output", "out", "--words", "sagen", "denken",
        ]);
        match cli.command {
            Command::Audio(AudioCommand::Generate { source, output, .. }) => {
                assert_eq!(source.words, vec!["sagen", "denken"]);
                assert_eq!(source.word, None);
                assert_eq!(output, PathBuf::from("out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.root, Some(PathBuf::from("/p")));
    }

    #[test]
    fn deck_kind_defaults_to_vocabulary() {
        let cli = Cli::parse_from(["vocab", "build-deck"]);
        assert!(matches!(
            cli.command,
            Command::BuildDeck {
                kind: DeckArg::Vocabulary,
                ..
            }
        ));
    }

    #[test]
    fn audio_generate_requires_output() {
        let err = Cli::try_parse_from(["vocab", "audio", "generate", "--word", "Hund"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("--output"));
    }

    #[test]
    fn audio_generate_requires_one_word_source() {
        let err = Cli::try_parse_from(["vocab", "audio", "generate", "--output", "out"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from([
            "vocab", "audio", "generate", "--output", "out", "--word", "Hund", "--words", "Katze",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }
}
