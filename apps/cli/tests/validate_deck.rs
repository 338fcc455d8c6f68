//! Deck-versus-source validation tests.

mod common;

use std::process::ExitCode;

use common::fixtures;
use common::TestContext;
use vocab_cli::commands;
use vocab_core::DeckKind;

const HUND: &str = "| a0000001 | Reverse RU→DE | Noun | собака | der Hund | die Hunde | Der Hund bellt. | Собака лает. | Haustier | — |";
const KATZE: &str = "| a0000002 | Reverse DE→RU | Noun | кошка | die Katze | die Katzen | Die Katze schläft. | Кошка спит. | Haustier | — |";
const GEHEN: &str = "| a0000003 | Reverse RU→DE | Verb | идти | gehen | ist gegangen | Ich gehe. | Я иду. | unregelmäßig | — |";

fn build(ctx: &TestContext, rows: &[&str]) {
    ctx.write(&ctx.paths.vocabulary_deck(), &fixtures::vocabulary_md(rows, rows.len()));
    commands::build::run(&ctx.paths, DeckKind::Vocabulary, None, None).unwrap();
}

/// Test a freshly built deck validates clean against its source.
#[test]
fn test_clean_deck() {
    let ctx = TestContext::new();
    build(&ctx, &[HUND, KATZE, GEHEN]);
    let report = ctx.paths.temp_dir().join("report.md");

    let code = commands::validate::run(
        &ctx.paths,
        None,
        Some(ctx.paths.package_for(DeckKind::Vocabulary)),
        None,
        Some(report.clone()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    let markdown = ctx.read(&report);
    assert!(markdown.starts_with("# Deck Validation Report\n"));
    assert!(markdown.contains("- **Cards in deck:** 3"));
    assert!(markdown.contains("No orphaned cards found!"));
    assert!(markdown.contains("No missing cards!"));
}

/// Test source rows added after the build show up as missing.
#[test]
fn test_missing_cards_fail_validation() {
    let ctx = TestContext::new();
    build(&ctx, &[HUND, GEHEN]);
    ctx.write(
        &ctx.paths.vocabulary_deck(),
        &fixtures::vocabulary_md(&[HUND, KATZE, GEHEN], 3),
    );
    let report = ctx.paths.temp_dir().join("report.md");

    let code = commands::validate::run(
        &ctx.paths,
        None,
        Some(ctx.paths.package_for(DeckKind::Vocabulary)),
        None,
        Some(report.clone()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::FAILURE);
    let markdown = ctx.read(&report);
    assert!(markdown.contains("- **Missing cards** (in MD, not in deck): **1**"));
    assert!(markdown.contains("a0000002"));
}

/// Test cards dropped from the source are listed as orphans, using the
/// unpacked JSON as input.
#[test]
fn test_orphans_from_deck_json() {
    let ctx = TestContext::new();
    build(&ctx, &[HUND, KATZE, GEHEN]);
    commands::unpack::run(&ctx.paths, None, None).unwrap();
    ctx.write(&ctx.paths.vocabulary_deck(), &fixtures::vocabulary_md(&[HUND, GEHEN], 2));

    let code = commands::validate::run(&ctx.paths, None, None, None, None).unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    let reports: Vec<_> = std::fs::read_dir(ctx.paths.temp_dir())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("validation_report_"))
        .collect();
    assert_eq!(reports.len(), 1);

    let markdown = ctx.read(&ctx.paths.temp_dir().join(&reports[0]));
    assert!(markdown.contains("## 🗑️ Orphaned Cards (DELETE THESE IN ANKI)"));
    assert!(markdown.contains("### 1. `a0000002`"));
    assert!(markdown.contains("- **Russian:** кошка"));
}

/// Test placeholder notes are reported but do not fail an in-sync deck.
#[test]
fn test_placeholder_fields_are_issues() {
    let ctx = TestContext::new();
    build(&ctx, &fixtures::VOCABULARY_ROWS[..1]);
    let report = ctx.paths.temp_dir().join("report.md");

    let code = commands::validate::run(
        &ctx.paths,
        None,
        Some(ctx.paths.package_for(DeckKind::Vocabulary)),
        None,
        Some(report.clone()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(ctx.read(&report).contains("Empty field: Notes"));
}
