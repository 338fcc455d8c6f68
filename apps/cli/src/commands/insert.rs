use super::{read_text, rule, today};
use crate::config::ProjectPaths;
use crate::fs_util::write_atomic;
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use vocab_core::pending::{parse_pending, to_records, IdGenerator};
use vocab_core::table::{append_rows, refresh_metadata};
use vocab_core::{parse_cards, render_row};

/// Append pending cards to the vocabulary table.
///
/// Everything is validated before the file is touched; the table is then
/// rewritten in one atomic step.
pub fn run(
    paths: &ProjectPaths,
    pending: Option<PathBuf>,
    deck: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let pending = pending.unwrap_or_else(|| paths.pending_cards());
    let deck = deck.unwrap_or_else(|| paths.vocabulary_deck());

    let cards = parse_pending(&read_text(&pending)?)
        .with_context(|| format!("loading {}", pending.display()))?;
    println!("Loaded {} pending cards", cards.len());

    let content = read_text(&deck)?;
    let table = parse_cards(&content).with_context(|| format!("parsing {}", deck.display()))?;
    for warning in &table.warnings {
        warn!("{}", warning);
    }

    let seed = Local::now().format("%Y%m%d%H%M%S%.f").to_string();
    let mut ids = IdGenerator::new(table.records.iter().map(|r| r.id.clone()), seed);
    let records = to_records(&cards, &mut ids)?;
    let rows = records
        .iter()
        .map(render_row)
        .collect::<Result<Vec<_>, _>>()?;

    for record in &records {
        println!("  + {} {} ({})", record.id, record.target_text, record.card_type);
    }

    if dry_run {
        for row in &rows {
            println!("{row}");
        }
        println!("Dry run: {} rows not written", rows.len());
        return Ok(ExitCode::SUCCESS);
    }

    let appended = append_rows(&content, &rows)?;
    let (updated, metadata) = refresh_metadata(&appended, &today())?;
    if !metadata.total_line_found {
        warn!("no '- Total cards:' line in {}", deck.display());
    }
    write_atomic(&deck, updated.as_bytes()).with_context(|| format!("writing {}", deck.display()))?;

    println!();
    rule();
    println!("Inserted: {} cards", records.len());
    println!("Total cards: {}", metadata.total);
    println!("Updated: {}", deck.display());
    rule();

    Ok(ExitCode::SUCCESS)
}
