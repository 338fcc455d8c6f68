//! Consistency checks between the markdown source and an unpacked deck.

use crate::types::{CardRecord, UnpackedCard, PLACEHOLDER};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

/// Fields that must carry content on every card that has them.
pub const REQUIRED_FIELDS: [&str; 3] = ["Example_DE", "Example_RU", "Notes"];

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static CLOZE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c\d+::.+?\}\}").expect("static regex"));

/// A message attached to one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardIssue {
    pub guid: String,
    pub message: String,
}

/// Source row that has no packaged counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCard {
    pub id: String,
    pub german: Option<String>,
    pub russian: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub deck_cards: usize,
    pub source_ids: usize,
    /// In the deck but not in the source, sorted by guid.
    pub orphaned: Vec<UnpackedCard>,
    /// In the source but not in the deck, sorted by id.
    pub missing: Vec<MissingCard>,
    pub duplicate_ids: BTreeMap<String, usize>,
    pub gender_mismatches: Vec<CardIssue>,
    pub empty_fields: Vec<CardIssue>,
    pub cloze_errors: Vec<CardIssue>,
}

impl ValidationReport {
    pub fn issue_count(&self) -> usize {
        self.duplicate_ids.len()
            + self.gender_mismatches.len()
            + self.empty_fields.len()
            + self.cloze_errors.len()
    }

    /// Every deck card is in the source and every source id is in the deck.
    pub fn in_sync(&self) -> bool {
        self.orphaned.is_empty() && self.missing.is_empty()
    }

    /// In sync and no card has an issue.
    pub fn is_clean(&self) -> bool {
        self.in_sync() && self.issue_count() == 0
    }
}

/// Article/gender consistency for cards with both fields.
pub fn check_gender_article(card: &UnpackedCard) -> Option<String> {
    let article = card.field("Article")?.trim().to_lowercase();
    let gender = card.field("Gender").unwrap_or_default().trim().to_lowercase();
    if article.is_empty() || gender.is_empty() {
        return None;
    }
    let expected = match article.as_str() {
        "der" => "m",
        "die" => "f",
        "das" => "n",
        _ => return None,
    };
    (gender != expected).then(|| {
        format!("Article '{article}' doesn't match gender '{gender}' (expected '{expected}')")
    })
}

/// `Empty field: X` for every required field that is blank once HTML is stripped.
pub fn check_empty_fields(card: &UnpackedCard) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter_map(|name| {
            let value = card.field(name)?;
            let clean = HTML_TAG.replace_all(value.trim(), "");
            (clean.is_empty() || clean == PLACEHOLDER).then(|| format!("Empty field: {name}"))
        })
        .collect()
}

fn preview(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Cloze marker check for cloze models.
pub fn check_cloze_syntax(card: &UnpackedCard) -> Option<String> {
    if !card.model_name.contains("Cloze") {
        return None;
    }
    let Some((_, value)) = card
        .fields
        .iter()
        .find(|(name, value)| name.to_lowercase().contains("cloze") || value.contains("{{c"))
    else {
        return Some("No cloze syntax found in cloze card".to_string());
    };
    if value.is_empty() {
        return Some("No cloze syntax found in cloze card".to_string());
    }
    (!CLOZE_MARKER.is_match(value))
        .then(|| format!("Invalid cloze syntax: {}...", preview(value, 50)))
}

/// Compare an unpacked deck with the source rows.
pub fn validate(cards: &[UnpackedCard], source: &[CardRecord]) -> ValidationReport {
    let source_by_id: HashMap<&str, &CardRecord> =
        source.iter().map(|r| (r.id.as_str(), r)).collect();
    let source_ids: BTreeSet<&str> = source_by_id.keys().copied().collect();

    let mut deck_by_guid: BTreeMap<&str, &UnpackedCard> = BTreeMap::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for card in cards {
        deck_by_guid.entry(card.guid.as_str()).or_insert(card);
        *counts.entry(card.guid.clone()).or_default() += 1;
    }

    let orphaned = deck_by_guid
        .iter()
        .filter(|(guid, _)| !source_ids.contains(*guid))
        .map(|(_, card)| (*card).clone())
        .collect();

    let missing = source_ids
        .iter()
        .filter(|id| !deck_by_guid.contains_key(*id))
        .map(|id| {
            let record = source_by_id.get(id);
            MissingCard {
                id: id.to_string(),
                german: record.map(|r| r.target_text.clone()),
                russian: record.map(|r| r.native_text.clone()),
            }
        })
        .collect();

    let mut report = ValidationReport {
        deck_cards: cards.len(),
        source_ids: source_ids.len(),
        orphaned,
        missing,
        duplicate_ids: counts.into_iter().filter(|(_, n)| *n > 1).collect(),
        gender_mismatches: Vec::new(),
        empty_fields: Vec::new(),
        cloze_errors: Vec::new(),
    };

    for card in cards {
        let issue = |message: String| CardIssue {
            guid: card.guid.clone(),
            message,
        };
        if let Some(message) = check_gender_article(card) {
            report.gender_mismatches.push(issue(message));
        }
        let empty = check_empty_fields(card);
        if !empty.is_empty() {
            report.empty_fields.push(issue(empty.join(", ")));
        }
        if let Some(message) = check_cloze_syntax(card) {
            report.cloze_errors.push(issue(message));
        }
    }

    report
}

/// First field among `names` that exists, for the orphan detail listing.
fn first_field<'a>(card: &'a UnpackedCard, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| card.field(name))
}

fn push_nonempty(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        lines.push(format!("- **{label}:** {value}"));
    }
}

/// Render the report as markdown. `generated` is the timestamp shown in the header.
pub fn render_markdown(report: &ValidationReport, generated: &str) -> String {
    let mut lines: Vec<String> = vec![
        "# Deck Validation Report".into(),
        format!("Generated: {generated}"),
        String::new(),
        "## Summary".into(),
        format!("- **Cards in deck:** {}", report.deck_cards),
        format!("- **Unique IDs in source MD:** {}", report.source_ids),
        format!(
            "- **Orphaned cards** (in deck, not in MD): **{}**",
            report.orphaned.len()
        ),
        format!(
            "- **Missing cards** (in MD, not in deck): **{}**",
            report.missing.len()
        ),
        String::new(),
    ];

    if report.orphaned.is_empty() {
        lines.push("## ✅ Orphaned Cards".into());
        lines.push(String::new());
        lines.push("No orphaned cards found! All cards in deck exist in source MD.".into());
        lines.push(String::new());
    } else {
        lines.push("## 🗑️ Orphaned Cards (DELETE THESE IN ANKI)".into());
        lines.push(String::new());
        lines.push(format!("**Total: {} cards**", report.orphaned.len()));
        lines.push(String::new());
        lines.push("These cards exist in your Anki deck but are NOT in the source MD file.".into());
        lines.push(String::new());

        for (i, card) in report.orphaned.iter().enumerate() {
            lines.push(format!("### {}. `{}`", i + 1, card.guid));
            lines.push(String::new());
            if let Some(russian) = card.field("Russian") {
                lines.push(format!("- **Russian:** {russian}"));
            }
            if let Some(german) = first_field(
                card,
                &["German", "Cloze_German", "Cloze_Text", "Infinitive", "Base", "Preposition"],
            ) {
                lines.push(format!("- **German:** {german}"));
            }
            for name in ["Article", "Noun", "Plural", "Perfekt", "Case"] {
                push_nonempty(&mut lines, name, card.field(name));
            }
            lines.push(format!("- **Card Type:** {}", card.model_name));
            if let Some(v) = card.field("Example_DE").filter(|v| !v.is_empty()) {
                lines.push(format!("- **Example (DE):** {}...", preview(v, 100)));
            }
            if let Some(v) = card.field("Example_RU").filter(|v| !v.is_empty()) {
                lines.push(format!("- **Example (RU):** {}...", preview(v, 100)));
            }
            if let Some(v) = card.field("Notes").filter(|v| !v.is_empty()) {
                lines.push(format!("- **Notes:** {}...", preview(v, 150)));
            }
            lines.push(String::new());
            lines.push("---".into());
            lines.push(String::new());
        }
    }

    if report.missing.is_empty() {
        lines.push("## ✅ Missing Cards".into());
        lines.push(String::new());
        lines.push("No missing cards! All IDs from source MD exist in deck.".into());
    } else {
        lines.push("## ⚠️ Missing Cards (IN MD, NOT IN DECK)".into());
        lines.push(String::new());
        lines.push(format!("**Total: {} IDs**", report.missing.len()));
        lines.push(String::new());
        lines.push("These IDs exist in source MD but were not found in the deck.".into());
        lines.push(String::new());
        for card in &report.missing {
            match (&card.german, &card.russian) {
                (Some(german), Some(russian)) => {
                    lines.push(format!("- `{}` - {} ({})", card.id, german, russian))
                }
                _ => lines.push(format!("- `{}`", card.id)),
            }
        }
    }
    lines.push(String::new());

    lines.push("## 🔍 Validation Issues".into());
    lines.push(String::new());

    if report.duplicate_ids.is_empty() {
        lines.push("### ✅ Duplicate IDs".into());
        lines.push("No duplicate IDs found.".into());
    } else {
        lines.push("### ❌ Duplicate IDs".into());
        lines.push(String::new());
        for (guid, count) in &report.duplicate_ids {
            lines.push(format!("- `{guid}` appears {count} times"));
        }
    }
    lines.push(String::new());

    issue_section(
        &mut lines,
        &report.gender_mismatches,
        "### ❌ Gender/Article Mismatches",
        "### ✅ Gender/Article Consistency",
        "All noun cards have consistent gender/article pairs.",
    );
    issue_section(
        &mut lines,
        &report.empty_fields,
        "### ⚠️ Empty Required Fields",
        "### ✅ Empty Fields",
        "No empty required fields found.",
    );
    issue_section(
        &mut lines,
        &report.cloze_errors,
        "### ❌ Invalid Cloze Syntax",
        "### ✅ Cloze Syntax",
        "All cloze cards have valid syntax.",
    );

    lines.join("\n")
}

fn issue_section(
    lines: &mut Vec<String>,
    issues: &[CardIssue],
    failed: &str,
    passed: &str,
    passed_note: &str,
) {
    if issues.is_empty() {
        lines.push(passed.to_string());
        lines.push(passed_note.to_string());
    } else {
        lines.push(failed.to_string());
        lines.push(String::new());
        for issue in issues {
            lines.push(format!("- **Card `{}`**: {}", issue.guid, issue.message));
        }
    }
    lines.push(String::new());
}
