use super::{read_text, rule};
use crate::config::ProjectPaths;
use crate::fs_util::write_atomic;
use crate::package;
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use vocab_core::validate::render_markdown;
use vocab_core::{parse_cards, validate, UnpackedDeck};

/// Exit code 1 only when the deck and the table disagree on card ids. Per-card
/// issues go to the report.
pub fn run(
    paths: &ProjectPaths,
    deck_json: Option<PathBuf>,
    apkg: Option<PathBuf>,
    source: Option<PathBuf>,
    report: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let started = Local::now();

    let deck: UnpackedDeck = match apkg {
        Some(apkg) => {
            let stamp = started.format("%Y-%m-%dT%H:%M:%S").to_string();
            package::unpack(&apkg, &stamp)
                .with_context(|| format!("unpacking {}", apkg.display()))?
                .deck
        }
        None => {
            let path = deck_json.unwrap_or_else(|| paths.deck_data());
            serde_json::from_str(&read_text(&path)?)
                .with_context(|| format!("parsing {}", path.display()))?
        }
    };
    info!("loaded {} cards from {}", deck.cards.len(), deck.source_file);

    let source = source.unwrap_or_else(|| paths.vocabulary_deck());
    let table = parse_cards(&read_text(&source)?)
        .with_context(|| format!("parsing {}", source.display()))?;
    for warning in &table.warnings {
        warn!("{}", warning);
    }

    let result = validate(&deck.cards, &table.records);
    let report_path = report.unwrap_or_else(|| {
        paths.validation_report(&started.format("%Y-%m-%d_%H-%M-%S").to_string())
    });
    let markdown = render_markdown(&result, &started.format("%Y-%m-%d %H:%M:%S").to_string());
    write_atomic(&report_path, markdown.as_bytes())
        .with_context(|| format!("writing {}", report_path.display()))?;

    rule();
    println!("Cards in deck: {}", result.deck_cards);
    println!("Unique IDs in source: {}", result.source_ids);
    println!("Orphaned cards (in deck, not in MD): {}", result.orphaned.len());
    println!("Missing cards (in MD, not in deck): {}", result.missing.len());
    println!("Duplicate IDs: {}", result.duplicate_ids.len());
    println!("Gender/article mismatches: {}", result.gender_mismatches.len());
    println!("Cards with empty fields: {}", result.empty_fields.len());
    println!("Cloze syntax errors: {}", result.cloze_errors.len());
    println!("Report saved to: {}", report_path.display());
    rule();

    Ok(if result.in_sync() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
