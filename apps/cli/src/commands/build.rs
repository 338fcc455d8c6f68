use super::{read_text, rule};
use crate::audio::AudioResolver;
use crate::config::ProjectPaths;
use crate::package::{collect_media, write_package};
use anyhow::Context;
use chrono::Utc;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use vocab_core::{build_deck, parse_cards, DeckKind};

/// Markdown table to `.apkg`.
///
/// Skipped rows and missing audio are reported but do not fail the build;
/// an invalid word type does.
pub fn run(
    paths: &ProjectPaths,
    kind: DeckKind,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let input = input.unwrap_or_else(|| paths.source_for(kind));
    let output = output.unwrap_or_else(|| paths.package_for(kind));
    let deck = kind.deck();

    info!("reading {}", input.display());
    let content = read_text(&input)?;
    let table = parse_cards(&content).with_context(|| format!("parsing {}", input.display()))?;
    for warning in &table.warnings {
        warn!("{}", warning);
    }
    info!("parsed {} cards from table", table.records.len());

    let mut build = build_deck(kind, &table.records).context("building notes")?;
    for warning in &build.warnings {
        warn!("{}", warning);
    }

    let resolver = AudioResolver::for_project(paths);
    let plan = collect_media(&build, |file| resolver.locate(file));
    let mut packaged: Vec<_> = plan.mapping.iter().collect();
    packaged.sort();
    for (file, name) in packaged {
        println!("  ✅ {file} → {name}");
    }
    for file in &plan.missing {
        println!("  ⚠️  {file} (not found)");
    }
    let updated = build.apply_media_names(&plan.mapping);
    info!("updated {} audio references", updated);

    let summary = write_package(&output, &build, &plan.files, Utc::now())
        .with_context(|| format!("writing {}", output.display()))?;
    if summary.collection.cardless_notes > 0 {
        warn!(
            "{} cloze notes have no cloze deletion and produce no cards",
            summary.collection.cardless_notes
        );
    }

    println!();
    rule();
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    println!("Deck: {}", deck.name);
    println!("Total cards: {}", build.notes.len());
    if build.skipped() > 0 {
        println!("Skipped: {} cards (see warnings above)", build.skipped());
    }
    println!("Audio files: {} found, {} missing", plan.files.len(), plan.missing.len());
    rule();

    Ok(ExitCode::SUCCESS)
}
