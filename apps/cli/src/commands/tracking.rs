use super::{read_text, rule, today};
use crate::audio::AudioResolver;
use crate::config::ProjectPaths;
use crate::fs_util::write_atomic;
use anyhow::{bail, Context};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use vocab_core::parse_cards;
use vocab_core::tracking::{
    create_tracking, parse_tracking, parse_word_list, refresh_entries, DeckWords, TrackingStats,
    TrackingTable,
};

fn deck_words(paths: &ProjectPaths) -> anyhow::Result<DeckWords> {
    let deck = paths.vocabulary_deck();
    let table = parse_cards(&read_text(&deck)?).with_context(|| format!("parsing {}", deck.display()))?;
    for warning in &table.warnings {
        warn!("{}", warning);
    }
    let words = DeckWords::from_records(&table.records);
    info!("found {} words in deck", words.len());
    Ok(words)
}

fn print_stats(stats: &TrackingStats) {
    println!("Total words: {}", stats.total());
    println!("In deck: {}", stats.in_deck);
    println!("Pending (with audio): {}", stats.pending);
    println!("Missing audio: {}", stats.missing_audio);
    if stats.error > 0 {
        println!("Error: {}", stats.error);
    }
}

pub fn create(paths: &ProjectPaths, words: Option<PathBuf>, force: bool) -> anyhow::Result<ExitCode> {
    let target = paths.word_tracking();
    if target.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", target.display());
    }

    let source = words.unwrap_or_else(|| paths.cleaned_words());
    let words = parse_word_list(&read_text(&source)?);
    if words.is_empty() {
        bail!("no numbered words found in {}", source.display());
    }
    info!("loaded {} words from {}", words.len(), source.display());

    let deck = deck_words(paths)?;
    let resolver = AudioResolver::for_project(paths);
    let (document, stats) = create_tracking(&words, &deck, |word| resolver.find_name(word), &today());
    write_atomic(&target, document.as_bytes())
        .with_context(|| format!("writing {}", target.display()))?;

    rule();
    print_stats(&stats);
    println!("Created: {}", target.display());
    rule();
    Ok(ExitCode::SUCCESS)
}

pub fn update(paths: &ProjectPaths) -> anyhow::Result<ExitCode> {
    let target = paths.word_tracking();
    let table = parse_tracking(&read_text(&target)?)
        .with_context(|| format!("parsing {}", target.display()))?;
    for warning in &table.warnings {
        warn!("{}", warning);
    }

    let deck = deck_words(paths)?;
    let resolver = AudioResolver::for_project(paths);
    let outcome = refresh_entries(&table.entries, &deck, |word| resolver.find_name(word), &today());

    if outcome.changes.is_empty() {
        println!("No changes");
    } else {
        println!("Changes ({}):", outcome.changes.len());
        for change in &outcome.changes {
            println!("  {change}");
        }
    }

    let document = TrackingTable {
        entries: outcome.entries,
        ..table
    }
    .render(&outcome.stats);
    write_atomic(&target, document.as_bytes())
        .with_context(|| format!("writing {}", target.display()))?;

    println!();
    rule();
    print_stats(&outcome.stats);
    println!("Updated: {}", target.display());
    rule();
    Ok(ExitCode::SUCCESS)
}
