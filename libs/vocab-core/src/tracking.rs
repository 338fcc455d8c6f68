//! Word tracking table: which words from the master list are in the deck,
//! which have audio, and which still need work.
//!
//! Audio lookups are passed in as closures so this module stays free of
//! filesystem access.

use crate::error::Result;
use crate::table::{join_cells, parse_table, RowWarning, TableLayout};
use crate::types::{is_blank, CardRecord, TrackingEntry, TrackingStatus, PLACEHOLDER};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const TRACKING_HEADER_PREFIX: &str = "| Word | Status |";
pub const TRACKING_HEADER: &str = "| Word | Status | Audio | IPA | Word Type | Date Added | Notes |";
pub const TRACKING_SEPARATOR: &str = "|------|--------|-------|-----|-----------|------------|-------|";

pub const TRACKING_TABLE: TableLayout = TableLayout {
    header_prefix: TRACKING_HEADER_PREFIX,
    arity: 7,
};

const TRACKING_PREAMBLE: &str = "# Word Tracking\n\n\
**Purpose:** Track all words from cleaned list and their processing status\n\n\
**Status values:**\n\
- `in_deck` - Already added to german_vocabulary_b1.md\n\
- `pending` - Not processed yet, has audio\n\
- `missing_audio` - No audio file found\n\
- `error` - Generation/validation failed\n\n\
---\n\n";

static CLOZE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c\d+::|\}\}").expect("static regex"));

/// Audio cell text for a lookup result.
pub fn audio_marker(found: Option<&str>) -> String {
    match found {
        Some(file) => format!("✅ {file}"),
        None => "❌ missing".to_string(),
    }
}

/// Vocabulary words present in the deck, keyed by lowercase headword.
#[derive(Debug, Clone, Default)]
pub struct DeckWords {
    words: HashSet<String>,
    types: HashMap<String, HashSet<String>>,
}

impl DeckWords {
    /// Collect headwords from reverse and cloze cards.
    ///
    /// The headword is the last whitespace token of the German cell after
    /// cloze markup is removed, so `der Hund` and `{{c1::der}} Hund` both
    /// yield `hund`.
    pub fn from_records(records: &[CardRecord]) -> Self {
        let mut deck = Self::default();
        for record in records {
            if !(record.card_type.contains("Reverse") || record.card_type.contains("Cloze")) {
                continue;
            }
            let Some(word) = headword(&record.target_text) else {
                continue;
            };
            let word_type = record.word_type.trim();
            if !word_type.is_empty() {
                deck.types
                    .entry(word.clone())
                    .or_default()
                    .insert(word_type.to_string());
            }
            deck.words.insert(word);
        }
        deck
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Match on the word alone when no type is given, on (word, type) otherwise.
    pub fn contains(&self, word: &str, word_type: &str) -> bool {
        let word = word.to_lowercase();
        if is_blank(word_type) {
            self.words.contains(&word)
        } else {
            self.types
                .get(&word)
                .is_some_and(|types| types.contains(word_type.trim()))
        }
    }
}

fn headword(german: &str) -> Option<String> {
    let stripped = CLOZE_MARKUP.replace_all(german, "");
    stripped.split_whitespace().last().map(str::to_lowercase)
}

/// Per-status counts, rendered as the statistics footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub in_deck: usize,
    pub pending: usize,
    pub missing_audio: usize,
    pub error: usize,
}

impl TrackingStats {
    pub fn record(&mut self, status: TrackingStatus) {
        match status {
            TrackingStatus::InDeck => self.in_deck += 1,
            TrackingStatus::Pending => self.pending += 1,
            TrackingStatus::MissingAudio => self.missing_audio += 1,
            TrackingStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.in_deck + self.pending + self.missing_audio + self.error
    }

    pub fn render_footer(&self) -> String {
        let mut out = String::from("\n---\n\n## Statistics\n\n");
        out.push_str(&format!("- **Total words:** {}\n", self.total()));
        out.push_str(&format!("- **In deck:** {}\n", self.in_deck));
        out.push_str(&format!("- **Pending (with audio):** {}\n", self.pending));
        out.push_str(&format!("- **Missing audio:** {}\n", self.missing_audio));
        if self.error > 0 {
            out.push_str(&format!("- **Error:** {}\n", self.error));
        }
        out.push_str(&format!("- **Ready to process:** {}\n", self.pending));
        out
    }
}

/// Tracking document split into the text before the table and its rows.
#[derive(Debug, Clone)]
pub struct TrackingTable {
    pub preamble: String,
    pub header: String,
    pub separator: String,
    pub entries: Vec<TrackingEntry>,
    pub warnings: Vec<RowWarning>,
}

impl TrackingTable {
    /// Render the document with a freshly computed statistics footer.
    ///
    /// Anything after the table in the source is replaced by the footer.
    pub fn render(&self, stats: &TrackingStats) -> String {
        let mut out = self.preamble.clone();
        out.push_str(&self.header);
        out.push('\n');
        out.push_str(&self.separator);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&render_entry(entry));
            out.push('\n');
        }
        out.push_str(&stats.render_footer());
        out
    }
}

/// Parse a tracking document.
pub fn parse_tracking(content: &str) -> Result<TrackingTable> {
    let table = parse_table(content, TRACKING_TABLE)?;
    let lines: Vec<&str> = content.split('\n').collect();

    let mut preamble = String::new();
    for line in &lines[..table.header_index] {
        preamble.push_str(line);
        preamble.push('\n');
    }

    let entries = table
        .rows
        .into_iter()
        .map(|row| {
            let mut cells = row.cells.into_iter();
            let mut next = || cells.next().unwrap_or_default();
            TrackingEntry {
                word: next(),
                status: next(),
                audio_marker: next(),
                ipa: next(),
                word_type: next(),
                date_added: next(),
                notes: next(),
            }
        })
        .collect();

    Ok(TrackingTable {
        preamble,
        header: lines[table.header_index].trim_end().to_string(),
        separator: lines[table.header_index + 1].trim_end().to_string(),
        entries,
        warnings: table.warnings,
    })
}

pub fn render_entry(entry: &TrackingEntry) -> String {
    join_cells(&[
        &entry.word,
        &entry.status,
        &entry.audio_marker,
        &entry.ipa,
        &entry.word_type,
        &entry.date_added,
        &entry.notes,
    ])
}

/// Outcome of refreshing every tracking row.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub entries: Vec<TrackingEntry>,
    pub stats: TrackingStats,
    /// Human-readable change lines, in row order.
    pub changes: Vec<String>,
}

/// Recompute status, audio marker and date for each entry.
///
/// `find_audio` returns the audio filename for a word, if any. An `error`
/// status survives as long as the word is neither in the deck nor has audio.
pub fn refresh_entries<F>(
    entries: &[TrackingEntry],
    deck: &DeckWords,
    find_audio: F,
    today: &str,
) -> RefreshOutcome
where
    F: Fn(&str) -> Option<String>,
{
    let mut stats = TrackingStats::default();
    let mut changes = Vec::new();
    let mut refreshed = Vec::with_capacity(entries.len());

    for entry in entries {
        let audio = find_audio(&entry.word);
        let new_marker = audio_marker(audio.as_deref());
        let old_status = entry.status.as_str();
        let mut date_added = entry.date_added.clone();
        let type_label = if entry.word_type == PLACEHOLDER || entry.word_type.is_empty() {
            String::new()
        } else {
            format!(" ({})", entry.word_type)
        };

        let status = if deck.contains(&entry.word, &entry.word_type) {
            if old_status != TrackingStatus::InDeck.as_str() {
                if date_added == PLACEHOLDER {
                    date_added = today.to_string();
                    changes.push(format!(
                        "{}{}: {} → in_deck (date: {})",
                        entry.word, type_label, old_status, today
                    ));
                } else {
                    changes.push(format!("{}{}: {} → in_deck", entry.word, type_label, old_status));
                }
            }
            TrackingStatus::InDeck
        } else if audio.is_some() {
            TrackingStatus::Pending
        } else if old_status == TrackingStatus::Error.as_str() {
            TrackingStatus::Error
        } else {
            TrackingStatus::MissingAudio
        };

        if entry.audio_marker != new_marker {
            changes.push(format!(
                "{}: audio {} → {}",
                entry.word, entry.audio_marker, new_marker
            ));
        }

        stats.record(status);
        refreshed.push(TrackingEntry {
            status: status.as_str().to_string(),
            audio_marker: new_marker,
            date_added,
            ..entry.clone()
        });
    }

    RefreshOutcome {
        entries: refreshed,
        stats,
        changes,
    }
}

/// Words from a numbered list (`123. word`). Lines without a dot are ignored.
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let (_, word) = line.trim().split_once('.')?;
            let word = word.trim();
            (!word.is_empty()).then(|| word.to_string())
        })
        .collect()
}

/// Build a fresh tracking document for `words`.
pub fn create_tracking<F>(
    words: &[String],
    deck: &DeckWords,
    find_audio: F,
    today: &str,
) -> (String, TrackingStats)
where
    F: Fn(&str) -> Option<String>,
{
    let mut stats = TrackingStats::default();
    let entries: Vec<TrackingEntry> = words
        .iter()
        .map(|word| {
            let audio = find_audio(word);
            let (status, date_added) = if deck.contains(word, "") {
                (TrackingStatus::InDeck, today.to_string())
            } else if audio.is_some() {
                (TrackingStatus::Pending, PLACEHOLDER.to_string())
            } else {
                (TrackingStatus::MissingAudio, PLACEHOLDER.to_string())
            };
            stats.record(status);
            TrackingEntry {
                word: word.clone(),
                status: status.as_str().to_string(),
                audio_marker: audio_marker(audio.as_deref()),
                ipa: PLACEHOLDER.to_string(),
                word_type: PLACEHOLDER.to_string(),
                date_added,
                notes: PLACEHOLDER.to_string(),
            }
        })
        .collect();

    let table = TrackingTable {
        preamble: TRACKING_PREAMBLE.to_string(),
        header: TRACKING_HEADER.to_string(),
        separator: TRACKING_SEPARATOR.to_string(),
        entries,
        warnings: Vec::new(),
    };
    (table.render(&stats), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(card_type: &str, word_type: &str, german: &str) -> CardRecord {
        CardRecord {
            id: "x".into(),
            card_type: card_type.into(),
            word_type: word_type.into(),
            native_text: "r".into(),
            target_text: german.into(),
            extra: "—".into(),
            example_target: "—".into(),
            example_native: "—".into(),
            notes: "—".into(),
            audio_ref: "—".into(),
        }
    }

    fn entry(word: &str, status: &str, word_type: &str, date: &str) -> TrackingEntry {
        TrackingEntry {
            word: word.into(),
            status: status.into(),
            audio_marker: "❌ missing".into(),
            ipa: "—".into(),
            word_type: word_type.into(),
            date_added: date.into(),
            notes: "—".into(),
        }
    }

    fn no_audio(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn headword_strips_cloze_and_takes_last_token() {
        assert_eq!(headword("der Hund").as_deref(), Some("hund"));
        assert_eq!(headword("{{c1::die}} Katze").as_deref(), Some("katze"));
        assert_eq!(headword("{{c2::gehen}}").as_deref(), Some("gehen"));
        assert_eq!(headword("  "), None);
    }

    #[test]
    fn deck_words_ignore_case_cards() {
        let deck = DeckWords::from_records(&[
            card("Reverse RU→DE", "Noun", "der Hund"),
            card("Preposition RU→DE", "Preposition", "mit"),
        ]);
        assert_eq!(deck.len(), 1);
        assert!(deck.contains("Hund", "—"));
        assert!(!deck.contains("mit", ""));
    }

    #[test]
    fn typed_entries_match_on_word_and_type() {
        let deck = DeckWords::from_records(&[card("Reverse RU→DE", "Verb", "essen")]);
        assert!(deck.contains("essen", "Verb"));
        assert!(!deck.contains("essen", "Noun"));
        assert!(deck.contains("essen", ""));
    }

    #[test]
    fn refresh_moves_to_in_deck_and_stamps_date() {
        let deck = DeckWords::from_records(&[card("Reverse RU→DE", "Noun", "der Hund")]);
        let out = refresh_entries(&[entry("Hund", "pending", "—", "—")], &deck, no_audio, "2025-11-08");
        assert_eq!(out.entries[0].status, "in_deck");
        assert_eq!(out.entries[0].date_added, "2025-11-08");
        assert_eq!(out.stats.in_deck, 1);
        assert_eq!(out.changes[0], "Hund: pending → in_deck (date: 2025-11-08)");
    }

    #[test]
    fn refresh_keeps_existing_date() {
        let deck = DeckWords::from_records(&[card("Reverse RU→DE", "Noun", "der Hund")]);
        let out = refresh_entries(&[entry("Hund", "in_deck", "—", "2024-01-01")], &deck, no_audio, "2025-11-08");
        assert_eq!(out.entries[0].date_added, "2024-01-01");
        assert!(out.changes.is_empty());
    }

    #[test]
    fn refresh_status_without_deck_membership() {
        let deck = DeckWords::default();
        let entries = [
            entry("Hund", "missing_audio", "—", "—"),
            entry("Katze", "error", "—", "—"),
            entry("Maus", "pending", "—", "—"),
        ];
        let audio = |word: &str| (word == "Hund").then(|| "Hund.wav".to_string());
        let out = refresh_entries(&entries, &deck, audio, "2025-11-08");
        let statuses: Vec<&str> = out.entries.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, vec!["pending", "error", "missing_audio"]);
        assert_eq!(out.entries[0].audio_marker, "✅ Hund.wav");
        assert_eq!(out.changes, vec!["Hund: audio ❌ missing → ✅ Hund.wav".to_string()]);
        assert_eq!(out.stats.total(), 3);
    }

    #[test]
    fn error_status_clears_once_audio_exists() {
        let out = refresh_entries(
            &[entry("Katze", "error", "—", "—")],
            &DeckWords::default(),
            |_: &str| Some("Katze.wav".to_string()),
            "2025-11-08",
        );
        assert_eq!(out.entries[0].status, "pending");
    }

    #[test]
    fn parse_and_render_tracking_document() {
        let content = format!(
            "# Word Tracking\n\nintro\n\n{}\n{}\n| Hund | pending | ✅ Hund.wav | — | Noun | — | — |\n\n---\n\n## Statistics\n\n- old\n",
            TRACKING_HEADER, TRACKING_SEPARATOR
        );
        let table = parse_tracking(&content).unwrap();
        assert_eq!(table.entries.len(), 1);
        assert_eq!(table.entries[0].word_type, "Noun");
        assert_eq!(table.preamble, "# Word Tracking\n\nintro\n\n");

        let mut stats = TrackingStats::default();
        stats.record(TrackingStatus::Pending);
        let rendered = table.render(&stats);
        assert!(rendered.starts_with("# Word Tracking\n\nintro\n\n| Word | Status |"));
        assert!(rendered.contains("| Hund | pending | ✅ Hund.wav | — | Noun | — | — |\n\n---\n"));
        assert!(rendered.ends_with("- **Ready to process:** 1\n"));
        assert!(!rendered.contains("- old"));
    }

    #[test]
    fn footer_shows_errors_only_when_present() {
        let mut stats = TrackingStats::default();
        assert!(!stats.render_footer().contains("**Error:**"));
        stats.record(TrackingStatus::Error);
        assert!(stats.render_footer().contains("- **Error:** 1\n"));
    }

    #[test]
    fn word_list_parsing() {
        let words = parse_word_list("1. Hund\n2. Katze\n\nnoise\n3. \n10. gehen\n");
        assert_eq!(words, vec!["Hund", "Katze", "gehen"]);
    }

    #[test]
    fn create_assigns_statuses() {
        let deck = DeckWords::from_records(&[card("Reverse RU→DE", "Noun", "der Hund")]);
        let words = vec!["Hund".to_string(), "Katze".to_string(), "Maus".to_string()];
        let audio = |word: &str| (word == "Katze").then(|| "Katze.mp3".to_string());
        let (doc, stats) = create_tracking(&words, &deck, audio, "2025-11-08");
        assert_eq!(stats, TrackingStats { in_deck: 1, pending: 1, missing_audio: 1, error: 0 });
        assert!(doc.contains("| Hund | in_deck | ❌ missing | — | — | 2025-11-08 | — |"));
        assert!(doc.contains("| Katze | pending | ✅ Katze.mp3 | — | — | — | — |"));
        let reparsed = parse_tracking(&doc).unwrap();
        assert_eq!(reparsed.entries.len(), 3);
    }
}
