use super::rule;
use crate::config::ProjectPaths;
use crate::fs_util::write_atomic;
use crate::package;
use anyhow::{bail, Context};
use chrono::Local;
use std::path::PathBuf;
use std::process::ExitCode;
use vocab_core::DeckKind;

pub fn run(paths: &ProjectPaths, apkg: Option<PathBuf>, output: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let apkg = apkg.unwrap_or_else(|| paths.package_for(DeckKind::Vocabulary));
    let output = output.unwrap_or_else(|| paths.deck_data());
    if !apkg.is_file() {
        bail!("package not found: {}", apkg.display());
    }

    let extracted_at = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let outcome = package::unpack(&apkg, &extracted_at)
        .with_context(|| format!("unpacking {}", apkg.display()))?;

    let json = serde_json::to_string_pretty(&outcome.deck)?;
    write_atomic(&output, json.as_bytes())
        .with_context(|| format!("writing {}", output.display()))?;

    rule();
    for deck in &outcome.deck.decks {
        println!("Deck: {} (ID: {})", deck.name, deck.id);
    }
    println!("Total cards: {}", outcome.deck.total_cards);
    if !outcome.unknown_models.is_empty() {
        println!("Skipped (unknown model): {}", outcome.unknown_models.len());
    }
    println!("Output: {}", output.display());
    rule();

    Ok(ExitCode::SUCCESS)
}
