//! Core types for the vocabulary pipeline.

use serde::{Deserialize, Serialize};

/// Cell value meaning "intentionally empty".
pub const PLACEHOLDER: &str = "—";

/// Marker substrings that carry the card direction.
pub const RU_DE_MARKER: &str = "RU→DE";
pub const DE_RU_MARKER: &str = "DE→RU";

/// Whether a cell is empty or the placeholder.
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER
}

/// Card type as written in the table's `Card Type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    #[serde(rename = "Reverse RU→DE")]
    ReverseRuDe,
    #[serde(rename = "Reverse DE→RU")]
    ReverseDeRu,
    #[serde(rename = "Cloze")]
    Cloze,
    #[serde(rename = "Preposition RU→DE")]
    PrepositionRuDe,
    #[serde(rename = "Preposition DE→RU")]
    PrepositionDeRu,
    #[serde(rename = "Translation RU→DE")]
    TranslationRuDe,
    #[serde(rename = "Translation DE→RU")]
    TranslationDeRu,
    #[serde(rename = "Case ID Cloze")]
    CaseIdCloze,
    #[serde(rename = "Cloze Declension")]
    DeclensionCloze,
}

impl CardType {
    pub const ALL: [CardType; 9] = [
        Self::ReverseRuDe,
        Self::ReverseDeRu,
        Self::Cloze,
        Self::PrepositionRuDe,
        Self::PrepositionDeRu,
        Self::TranslationRuDe,
        Self::TranslationDeRu,
        Self::CaseIdCloze,
        Self::DeclensionCloze,
    ];

    /// Get the card type as it appears in the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReverseRuDe => "Reverse RU→DE",
            Self::ReverseDeRu => "Reverse DE→RU",
            Self::Cloze => "Cloze",
            Self::PrepositionRuDe => "Preposition RU→DE",
            Self::PrepositionDeRu => "Preposition DE→RU",
            Self::TranslationRuDe => "Translation RU→DE",
            Self::TranslationDeRu => "Translation DE→RU",
            Self::CaseIdCloze => "Case ID Cloze",
            Self::DeclensionCloze => "Cloze Declension",
        }
    }

    /// Parse from the exact table spelling.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ct| ct.as_str() == s)
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the card is asked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    RuDe,
    DeRu,
}

impl Direction {
    /// Detect the direction marker anywhere in a raw card-type string.
    pub fn from_card_type(card_type: &str) -> Option<Self> {
        if card_type.contains(RU_DE_MARKER) {
            Some(Self::RuDe)
        } else if card_type.contains(DE_RU_MARKER) {
            Some(Self::DeRu)
        } else {
            None
        }
    }
}

/// One row of the vocabulary table.
///
/// Values are kept exactly as written; card and word types are resolved when
/// the deck is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub card_type: String,
    pub word_type: String,
    /// Russian column.
    pub native_text: String,
    /// German column.
    pub target_text: String,
    /// Plural, Perfekt, comparative forms or governed case.
    pub extra: String,
    pub example_target: String,
    pub example_native: String,
    pub notes: String,
    pub audio_ref: String,
}

impl CardRecord {
    /// Cells in table column order.
    pub fn cells(&self) -> [(&'static str, &str); 10] {
        [
            ("ID", &self.id),
            ("Card Type", &self.card_type),
            ("Word Type", &self.word_type),
            ("Russian", &self.native_text),
            ("German", &self.target_text),
            ("Extra", &self.extra),
            ("Example_DE", &self.example_target),
            ("Example_RU", &self.example_native),
            ("Notes", &self.notes),
            ("Audio", &self.audio_ref),
        ]
    }

    /// Build from ten cells in table column order.
    pub fn from_cells(cells: [String; 10]) -> Self {
        let [id, card_type, word_type, native_text, target_text, extra, example_target, example_native, notes, audio_ref] =
            cells;
        Self {
            id,
            card_type,
            word_type,
            native_text,
            target_text,
            extra,
            example_target,
            example_native,
            notes,
            audio_ref,
        }
    }

    /// Resolved card type, if the raw value is a known spelling.
    pub fn kind(&self) -> Option<CardType> {
        CardType::from_str(&self.card_type)
    }

    /// Audio filename, or `None` when the column is blank.
    pub fn audio_file(&self) -> Option<&str> {
        let audio = self.audio_ref.trim();
        (!audio.is_empty() && audio != PLACEHOLDER).then_some(audio)
    }
}

/// Word processing status in the tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    InDeck,
    Pending,
    MissingAudio,
    Error,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InDeck => "in_deck",
            Self::Pending => "pending",
            Self::MissingAudio => "missing_audio",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_deck" => Some(Self::InDeck),
            "pending" => Some(Self::Pending),
            "missing_audio" => Some(Self::MissingAudio),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the word tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub word: String,
    /// Raw status cell. Kept as text so unknown values survive a rewrite.
    pub status: String,
    pub audio_marker: String,
    pub ipa: String,
    pub word_type: String,
    pub date_added: String,
    pub notes: String,
}

impl TrackingEntry {
    pub fn status(&self) -> Option<TrackingStatus> {
        TrackingStatus::from_str(&self.status)
    }
}

/// Deck identity stored in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckInfo {
    pub id: i64,
    pub name: String,
}

/// Note read back from a packaged deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackedCard {
    pub note_id: i64,
    pub guid: String,
    pub model_id: i64,
    pub model_name: String,
    pub tags: String,
    pub fields: FieldMap,
}

impl UnpackedCard {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }
}

/// Field values in template order.
///
/// Serialised as a JSON object whose keys keep the template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, String)>);

impl Serialize for FieldMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> serde::de::Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of field names to values")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut fields = FieldMap::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    fields.insert(name, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair names with values positionally; missing values become empty.
    pub fn zip_padded<N: AsRef<str>>(names: &[N], values: &[&str]) -> Self {
        Self(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = values.get(i).map(|v| v.trim()).unwrap_or_default();
                    (name.as_ref().to_string(), value.to_string())
                })
                .collect(),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Unpacked package contents, as written to `deck_data.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpackedDeck {
    pub source_file: String,
    pub extracted_at: String,
    pub decks: Vec<DeckInfo>,
    pub total_cards: usize,
    pub cards: Vec<UnpackedCard>,
}
