//! German vocabulary deck pipeline.
//!
//! Turns the markdown card tables into Anki packages, reads packages back,
//! checks them against the tables, maintains the word tracking table and
//! drives Piper for word and sentence audio.

pub mod audio;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod fs_util;
pub mod logging;
pub mod package;
pub mod tts;

use crate::cli::{AudioCommand, Cli, Command, TrackingCommand};
use crate::config::ProjectPaths;
use clap::Parser;
use std::process::ExitCode;

pub fn run() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    let paths = ProjectPaths::resolve(cli.root.as_deref())?;
    tracing::debug!("project root: {}", paths.root.display());

    match cli.command {
        Command::BuildDeck { kind, input, output } => {
            commands::build::run(&paths, kind.into(), input, output)
        }
        Command::Unpack { apkg, output } => commands::unpack::run(&paths, apkg, output),
        Command::Validate {
            deck_json,
            apkg,
            source,
            report,
        } => commands::validate::run(&paths, deck_json, apkg, source, report),
        Command::Insert {
            pending,
            deck,
            dry_run,
        } => commands::insert::run(&paths, pending, deck, dry_run),
        Command::CheckMetadata { deck, fix } => commands::metadata::run(&paths, deck, fix),
        Command::Tracking(TrackingCommand::Create { words, force }) => {
            commands::tracking::create(&paths, words, force)
        }
        Command::Tracking(TrackingCommand::Update) => commands::tracking::update(&paths),
        Command::Audio(AudioCommand::Generate {
            source,
            output,
            voice,
        }) => commands::audio::generate(&paths, source, output, voice),
        Command::Audio(AudioCommand::Sentence {
            text,
            output_file,
            voice,
        }) => commands::audio::sentence(&paths, &text, &output_file, voice),
        Command::Audio(AudioCommand::Check { words }) => commands::audio::check(&paths, &words),
    }
}
