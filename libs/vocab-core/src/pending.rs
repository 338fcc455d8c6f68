//! Pending cards: a JSON batch of new cards waiting to be added to the
//! vocabulary table.
//!
//! ```json
//! {"cards": [{"card_type": "Reverse", "word_type": "Noun", "russian": "собака",
//!   "german": "der Hund", "extra": "die Hunde", "example_de": "...",
//!   "example_ru": "...", "notes": "—", "audio": "Hund.wav"}]}
//! ```

use crate::error::{ParseError, Result};
use crate::types::{CardRecord, CardType};
use crate::word_type;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Card type that expands into both reverse directions.
pub const REVERSE_PAIR: &str = "Reverse";

/// Fields every pending card must carry.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "card_type",
    "word_type",
    "russian",
    "german",
    "extra",
    "example_de",
    "example_ru",
    "notes",
    "audio",
];

/// A card as written in the pending batch. The ID is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCard {
    pub card_type: String,
    pub word_type: String,
    pub russian: String,
    pub german: String,
    pub extra: String,
    pub example_de: String,
    pub example_ru: String,
    pub notes: String,
    pub audio: String,
}

#[derive(Deserialize)]
struct PendingBatch {
    cards: Vec<PendingCard>,
}

fn invalid(message: impl Into<String>) -> ParseError {
    ParseError::InvalidPending(message.into())
}

/// Parse and structurally validate a pending batch.
pub fn parse_pending(json: &str) -> Result<Vec<PendingCard>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| invalid(format!("Invalid JSON: {e}")))?;

    let root = value
        .as_object()
        .ok_or_else(|| invalid("Root must be an object"))?;
    let cards = root
        .get("cards")
        .ok_or_else(|| invalid("Missing 'cards' array"))?
        .as_array()
        .ok_or_else(|| invalid("'cards' must be an array"))?;
    if cards.is_empty() {
        return Err(invalid("'cards' array is empty"));
    }

    for (i, card) in cards.iter().enumerate() {
        let card = card
            .as_object()
            .ok_or_else(|| invalid(format!("Card {i} is not an object")))?;
        for field in REQUIRED_FIELDS {
            match card.get(field) {
                None => return Err(invalid(format!("Card {i} missing required field: {field}"))),
                Some(Value::String(_)) => {}
                Some(_) => return Err(invalid(format!("Card {i} field {field} must be a string"))),
            }
        }
    }

    let batch: PendingBatch = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    Ok(batch.cards)
}

/// `Reverse` becomes an RU→DE and a DE→RU card; anything else is kept.
pub fn expand_reverse(card: &PendingCard) -> Vec<PendingCard> {
    if card.card_type != REVERSE_PAIR {
        return vec![card.clone()];
    }
    [CardType::ReverseRuDe, CardType::ReverseDeRu]
        .into_iter()
        .map(|ct| PendingCard {
            card_type: ct.as_str().to_string(),
            ..card.clone()
        })
        .collect()
}

/// Hands out 8-hex-character card IDs that are unique within the table.
#[derive(Debug)]
pub struct IdGenerator {
    taken: HashSet<String>,
    seed: String,
    counter: u64,
}

impl IdGenerator {
    /// `seed` is usually the current timestamp.
    pub fn new(existing: impl IntoIterator<Item = String>, seed: impl Into<String>) -> Self {
        Self {
            taken: existing.into_iter().collect(),
            seed: seed.into(),
            counter: 0,
        }
    }

    pub fn next_id(&mut self, german: &str, card_type: &str) -> String {
        loop {
            let mut hasher = Sha256::new();
            hasher.update(format!("{german}_{card_type}_{}_{}", self.seed, self.counter).as_bytes());
            self.counter += 1;
            let id = format!("{:x}", hasher.finalize())[..8].to_string();
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Expand, validate and assign IDs. Nothing is returned unless every card is
/// valid.
pub fn to_records(cards: &[PendingCard], ids: &mut IdGenerator) -> Result<Vec<CardRecord>> {
    let expanded: Vec<PendingCard> = cards.iter().flat_map(expand_reverse).collect();

    for (i, card) in expanded.iter().enumerate() {
        if CardType::from_str(&card.card_type).is_none() {
            return Err(invalid(format!(
                "Card {i} ({}) has unknown card type '{}'",
                card.german, card.card_type
            )));
        }
        word_type::validate_strict(&card.word_type, &format!("(pending card '{}')", card.german))?;
    }

    Ok(expanded
        .into_iter()
        .map(|card| CardRecord {
            id: ids.next_id(&card.german, &card.card_type),
            card_type: card.card_type,
            word_type: card.word_type,
            native_text: card.russian,
            target_text: card.german,
            extra: card.extra,
            example_target: card.example_de,
            example_native: card.example_ru,
            notes: card.notes,
            audio_ref: card.audio,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch(cards: &str) -> String {
        format!(r#"{{"cards": [{cards}]}}"#)
    }

    const HUND: &str = r#"{"card_type": "Reverse", "word_type": "Noun", "russian": "собака",
        "german": "der Hund", "extra": "die Hunde", "example_de": "Der Hund bellt.",
        "example_ru": "Собака лает.", "notes": "—", "audio": "Hund.wav"}"#;

    fn err_message(json: &str) -> String {
        parse_pending(json).unwrap_err().to_string()
    }

    #[test]
    fn structure_errors() {
        assert!(err_message("[]").contains("Root must be an object"));
        assert!(err_message("{}").contains("Missing 'cards' array"));
        assert!(err_message(r#"{"cards": 1}"#).contains("'cards' must be an array"));
        assert!(err_message(r#"{"cards": []}"#).contains("'cards' array is empty"));
        assert!(err_message(r#"{"cards": [1]}"#).contains("Card 0 is not an object"));
        assert!(err_message(&batch(r#"{"card_type": "Cloze"}"#))
            .contains("Card 0 missing required field: word_type"));
        assert!(err_message("{").contains("Invalid JSON"));
    }

    #[test]
    fn reverse_expands_into_two_directions() {
        let cards = parse_pending(&batch(HUND)).unwrap();
        let expanded = expand_reverse(&cards[0]);
        let types: Vec<&str> = expanded.iter().map(|c| c.card_type.as_str()).collect();
        assert_eq!(types, vec!["Reverse RU→DE", "Reverse DE→RU"]);
        assert_eq!(expanded[1].german, "der Hund");
    }

    #[test]
    fn ids_are_unique_and_avoid_existing() {
        let mut ids = IdGenerator::new(Vec::new(), "1700000000.0");
        let first = ids.next_id("der Hund", "Cloze");
        let mut again = IdGenerator::new(vec![first.clone()], "1700000000.0");
        let second = again.next_id("der Hund", "Cloze");
        assert_eq!(first.len(), 8);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn records_get_ids_and_columns() {
        let cards = parse_pending(&batch(HUND)).unwrap();
        let mut ids = IdGenerator::new(Vec::new(), "seed");
        let records = to_records(&cards, &mut ids).unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
        assert_eq!(records[0].native_text, "собака");
        assert_eq!(records[0].extra, "die Hunde");
        assert_eq!(records[1].audio_ref, "Hund.wav");
    }

    #[test]
    fn bad_word_type_rejects_the_whole_batch() {
        let bad = HUND.replace("\"Noun\"", "\"noun\"");
        let cards = parse_pending(&batch(&format!("{HUND}, {bad}"))).unwrap();
        let err = to_records(&cards, &mut IdGenerator::new(Vec::new(), "s")).unwrap_err();
        assert!(matches!(err, ParseError::WordType(_)));
        assert!(err.to_string().contains("'Noun'"));
    }

    #[test]
    fn unknown_card_type_is_rejected() {
        let bad = HUND.replace("\"Reverse\"", "\"Flip\"");
        let cards = parse_pending(&batch(&bad)).unwrap();
        let err = to_records(&cards, &mut IdGenerator::new(Vec::new(), "s")).unwrap_err();
        assert!(err.to_string().contains("unknown card type 'Flip'"));
    }
}
