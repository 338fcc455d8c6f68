use super::{read_text, today};
use crate::config::ProjectPaths;
use crate::fs_util::write_atomic;
use anyhow::bail;
use std::path::PathBuf;
use std::process::ExitCode;
use vocab_core::table::{count_table_rows, metadata_total, refresh_metadata};

pub fn run(paths: &ProjectPaths, deck: Option<PathBuf>, fix: bool) -> anyhow::Result<ExitCode> {
    let deck = deck.unwrap_or_else(|| paths.vocabulary_deck());
    let content = read_text(&deck)?;

    let actual = count_table_rows(&content)?;
    let recorded = metadata_total(&content);

    println!("Actual cards in table:  {actual}");
    match recorded {
        Some(total) => println!("Metadata card count:    {total}"),
        None => println!("Metadata card count:    (missing)"),
    }

    if recorded == Some(actual) {
        println!("✅ SYNC OK - Metadata matches actual card count");
        return Ok(ExitCode::SUCCESS);
    }

    match recorded {
        Some(total) => println!(
            "❌ SYNC ERROR - Metadata is off by {} cards",
            actual as i64 - total as i64
        ),
        None => println!("❌ SYNC ERROR - No '- Total cards:' line found"),
    }

    if !fix {
        println!("Run with --fix to rewrite the metadata.");
        return Ok(ExitCode::FAILURE);
    }

    let (updated, update) = refresh_metadata(&content, &today())?;
    if !update.total_line_found {
        bail!("{} has no '- Total cards:' line to fix", deck.display());
    }
    write_atomic(&deck, updated.as_bytes())?;
    println!("✅ Metadata updated to {} cards", update.total);
    Ok(ExitCode::SUCCESS)
}
