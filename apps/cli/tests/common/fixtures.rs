//! Test fixtures and factory functions for creating test data.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use vocab_cli::db::CollectionWriter;
use vocab_core::{build_deck, CardRecord, DeckKind};

pub const VOCABULARY_HEADER: &str = "| ID | Card Type | Word Type | Russian | German | Extra | Example_DE | Example_RU | Notes | Audio |\n|----|-----------|-----------|---------|--------|-------|------------|------------|-------|-------|";

/// One row per vocabulary model, in model id order.
pub const VOCABULARY_ROWS: [&str; 11] = [
    "| 00000001 | Reverse RU→DE | Noun | собака | der Hund | die Hunde | Der Hund bellt. | Собака лает. | — | Hund.wav |",
    "| 00000002 | Reverse DE→RU | Noun | собака | der Hund | die Hunde | Der Hund bellt. | Собака лает. | — | Hund.wav |",
    "| 00000003 | Cloze | Noun | собака | {{c1::der}} Hund | die Hunde | Der Hund bellt. | Собака лает. | — | — |",
    "| 00000004 | Reverse RU→DE | Verb | идти | gehen | ist gegangen | Ich gehe nach Hause. | Я иду домой. | — | — |",
    "| 00000005 | Reverse DE→RU | Verb | идти | gehen | ist gegangen | Ich gehe nach Hause. | Я иду домой. | — | — |",
    "| 00000006 | Reverse RU→DE | Adjective | большой | groß | größer, am größten | Das Haus ist groß. | Дом большой. | — | Groß.wav |",
    "| 00000007 | Reverse DE→RU | Adjective | большой | groß | größer, am größten | Das Haus ist groß. | Дом большой. | — | Groß.wav |",
    "| 00000008 | Reverse RU→DE | Preposition | с | mit | + Dativ | Ich fahre mit dem Bus. | Я еду на автобусе. | — | — |",
    "| 00000009 | Reverse DE→RU | Preposition | с | mit | + Dativ | Ich fahre mit dem Bus. | Я еду на автобусе. | — | — |",
    "| 0000000a | Reverse RU→DE | Adverb | очень | sehr | — | Das ist sehr gut. | Это очень хорошо. | — | Sehr.mp3 |",
    "| 0000000b | Reverse DE→RU | Adverb | очень | sehr | — | Das ist sehr gut. | Это очень хорошо. | — | Sehr.mp3 |",
];

/// Vocabulary document with metadata, the table and a trailing section.
///
/// # Arguments
/// * `rows` - Table body lines
/// * `total` - Value written into `- Total cards:`
pub fn vocabulary_md(rows: &[&str], total: usize) -> String {
    format!(
        "# German Vocabulary B1\n\n- Total cards: {total}\n- Generated: 2025-01-01\n\n{VOCABULARY_HEADER}\n{}\n\n## Notes\n\nTrailing section.\n",
        rows.join("\n")
    )
}

pub const CASES_ROWS: [&str; 7] = [
    "| c0000001 | Preposition RU→DE | Preposition | с (кем-то) | mit + Dativ | Dativ | Ich gehe mit dem Freund. | Я иду с другом. | — | — |",
    "| c0000002 | Preposition DE→RU | Preposition | с (кем-то) | mit + Dativ | Dativ | Ich gehe mit dem Freund. | Я иду с другом. | — | — |",
    "| c0000003 | Cloze Declension | — | Dativ, maskulin: -em | Ich helfe {{c1::dem}} Mann. | Dativ/m | — | Я помогаю мужчине. | — | — |",
    "| c0000004 | Case ID Cloze | — | helfen + Dativ | Ich helfe {{c1::dem}} Kind. | Dativ/n | — | Я помогаю ребёнку. | — | — |",
    "| c0000005 | Translation RU→DE | — | Я вижу собаку. | Ich sehe den Hund. | — | — | — | Akkusativ | — |",
    "| c0000006 | Translation DE→RU | — | Я вижу собаку. | Ich sehe den Hund. | — | — | — | Akkusativ | — |",
    "| c0000007 | Reverse RU→DE | Noun | собака | der Hund | — | — | — | — | — |",
];

pub fn cases_md() -> String {
    vocabulary_md(&CASES_ROWS, CASES_ROWS.len())
}

/// Tracking document with the given entry lines.
pub fn tracking_md(rows: &[&str]) -> String {
    format!(
        "# Word Tracking\n\n---\n\n| Word | Status | Audio | IPA | Word Type | Date Added | Notes |\n|------|--------|-------|-----|-----------|------------|-------|\n{}\n\n---\n\n## Statistics\n\n- **Total words:** 0\n",
        rows.join("\n")
    )
}

/// Pending batch with one card per `(card_type, word_type, german)`.
pub fn pending_json(cards: &[(&str, &str, &str)]) -> String {
    let cards: Vec<serde_json::Value> = cards
        .iter()
        .map(|(card_type, word_type, german)| {
            serde_json::json!({
                "card_type": card_type,
                "word_type": word_type,
                "russian": "перевод",
                "german": german,
                "extra": "—",
                "example_de": "Beispiel.",
                "example_ru": "Пример.",
                "notes": "—",
                "audio": "—"
            })
        })
        .collect();
    serde_json::json!({ "cards": cards }).to_string()
}

pub fn created() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-11-08T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Write a legacy collection holding one verb note with the given guid.
pub fn legacy_collection(path: &Path, guid: &str) {
    let record = CardRecord::from_cells(
        [guid, "Reverse RU→DE", "Verb", "знать", "wissen", "wusste", "—", "—", "—", "—"]
            .map(str::to_string),
    );
    let build = build_deck(DeckKind::Vocabulary, &[record]).expect("valid record");
    CollectionWriter::create(path)
        .expect("Failed to create collection")
        .write_deck(&build, created())
        .expect("Failed to write collection");
}

const SPLIT_SCHEMA: &str = r#"
CREATE TABLE notetypes (id INTEGER PRIMARY KEY, name TEXT NOT NULL, mtime_secs INTEGER NOT NULL, usn INTEGER NOT NULL, config BLOB NOT NULL);
CREATE TABLE fields (ntid INTEGER NOT NULL, ord INTEGER NOT NULL, name TEXT NOT NULL, config BLOB NOT NULL, PRIMARY KEY (ntid, ord));
CREATE TABLE decks (id INTEGER PRIMARY KEY, name TEXT NOT NULL, mtime_secs INTEGER NOT NULL, usn INTEGER NOT NULL, common BLOB NOT NULL, kind BLOB NOT NULL);
CREATE TABLE notes (id INTEGER PRIMARY KEY, guid TEXT NOT NULL, mid INTEGER NOT NULL, mod INTEGER NOT NULL, usn INTEGER NOT NULL, tags TEXT NOT NULL, flds TEXT NOT NULL, sfld INTEGER NOT NULL, csum INTEGER NOT NULL, flags INTEGER NOT NULL, data TEXT NOT NULL);
"#;

/// Write a split-schema collection: one verb note `modern01` with a short
/// field list, and one note whose model does not exist.
pub fn split_collection(path: &Path) {
    let conn = rusqlite::Connection::open(path).expect("Failed to create collection");
    conn.execute_batch(SPLIT_SCHEMA).expect("Failed to create schema");
    conn.execute(
        "INSERT INTO notetypes VALUES (1607392322, 'German Verb (RU→DE)', 0, 0, x'')",
        [],
    )
    .expect("notetype");
    for (ord, name) in ["ID", "Russian", "Infinitive", "Perfekt", "Example_DE", "Example_RU", "Notes", "Audio"]
        .iter()
        .enumerate()
    {
        conn.execute(
            "INSERT INTO fields VALUES (1607392322, ?1, ?2, x'')",
            rusqlite::params![ord as i64, name],
        )
        .expect("field");
    }
    conn.execute("INSERT INTO decks VALUES (1, 'Default', 0, 0, x'', x'')", [])
        .expect("deck");
    conn.execute(
        "INSERT INTO decks VALUES (1234567890, 'German' || char(31) || 'B1', 0, 0, x'', x'')",
        [],
    )
    .expect("deck");
    conn.execute(
        "INSERT INTO notes VALUES (1, 'modern01', 1607392322, 0, 0, ' verb ', 'modern01' || char(31) || 'знать' || char(31) || ' wissen ' || char(31) || 'wusste', 'modern01', 0, 0, '')",
        [],
    )
    .expect("note");
    conn.execute(
        "INSERT INTO notes VALUES (2, 'orphan01', 42, 0, 0, '', 'orphan01', 'orphan01', 0, 0, '')",
        [],
    )
    .expect("note");
}

/// Zip the given `(entry name, file)` pairs into `path`.
pub fn zip_files(path: &Path, entries: &[(&str, &Path)]) {
    let file = fs::File::create(path).expect("Failed to create package");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, source) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(&fs::read(source).expect("read entry")).expect("write entry");
    }
    zip.start_file("media", options).expect("start media");
    zip.write_all(b"{}").expect("write media");
    zip.finish().expect("finish package");
}

/// Package with a zstd-compressed split-schema `collection.anki21b` and a
/// legacy `collection.anki2` holding a different note.
#[cfg(feature = "zstd")]
pub fn modern_package(dir: &Path) -> PathBuf {
    let modern_db = dir.join("modern.db");
    split_collection(&modern_db);
    let compressed = dir.join("collection.anki21b");
    let encoded = zstd::encode_all(fs::File::open(&modern_db).expect("open db"), 3).expect("compress");
    fs::write(&compressed, encoded).expect("write compressed");

    let legacy_db = dir.join("legacy.anki2");
    legacy_collection(&legacy_db, "legacy01");

    let package = dir.join("modern.apkg");
    zip_files(
        &package,
        &[
            ("collection.anki2", legacy_db.as_path()),
            ("collection.anki21b", compressed.as_path()),
        ],
    );
    package
}
