//! Note models and card-to-note field assembly.
//!
//! Every table row becomes one note. The vocabulary deck picks the model from
//! the word type and the direction marker in the card type; the cases deck
//! maps the card type directly.

use crate::error::WordTypeError;
use crate::types::{is_blank, CardRecord, CardType, DeckInfo, Direction};
use crate::word_type::{self, ModelCategory};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Prefix for packaged media names, so decks in other languages never clash.
pub const LANGUAGE_PREFIX: &str = "de";

static SOUND_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("static regex"));

/// Which deck a table feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Vocabulary,
    Cases,
}

impl DeckKind {
    pub fn deck(&self) -> DeckInfo {
        match self {
            Self::Vocabulary => DeckInfo {
                id: 1234567890,
                name: "German Vocabulary - B1".to_string(),
            },
            Self::Cases => DeckInfo {
                id: 1234567891,
                name: "German Cases - Declension & Prepositions".to_string(),
            },
        }
    }

    /// Models a deck of this kind can contain.
    pub fn templates(&self) -> &'static [TemplateKey] {
        use TemplateKey::*;
        match self {
            Self::Vocabulary => &[
                NounRuDe, NounDeRu, NounCloze, VerbRuDe, VerbDeRu, AdjRuDe, AdjDeRu, PrepRuDe,
                PrepDeRu, AdvRuDe, AdvDeRu,
            ],
            Self::Cases => &[
                CasePrepRuDe,
                CasePrepDeRu,
                DeclensionCloze,
                TranslationRuDe,
                TranslationDeRu,
                CaseIdCloze,
            ],
        }
    }
}

/// Standard models have one card per note, cloze models one per deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Standard,
    Cloze,
}

/// Note model identity, field layout and card template.
#[derive(Debug, Clone, Copy)]
pub struct NoteModel {
    pub id: i64,
    pub name: &'static str,
    pub kind: ModelKind,
    pub fields: &'static [&'static str],
    pub template_name: &'static str,
    pub qfmt: &'static str,
    pub afmt: &'static str,
    pub css: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Noun,
    NounCloze,
    Verb,
    Adjective,
    Preposition,
    Adverb,
    CasePreposition,
    CaseCloze,
    Translation,
}

/// One note model per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    NounRuDe,
    NounDeRu,
    NounCloze,
    VerbRuDe,
    VerbDeRu,
    AdjRuDe,
    AdjDeRu,
    PrepRuDe,
    PrepDeRu,
    AdvRuDe,
    AdvDeRu,
    CasePrepRuDe,
    CasePrepDeRu,
    DeclensionCloze,
    TranslationRuDe,
    TranslationDeRu,
    CaseIdCloze,
}

const NOUN_FIELDS: &[&str] = &[
    "ID", "Russian", "Article", "Noun", "Plural", "Gender", "Example_DE", "Example_RU", "Notes",
    "Audio",
];
const NOUN_CLOZE_FIELDS: &[&str] = &[
    "ID", "Cloze_German", "Plural", "Example_DE", "Example_RU", "Notes", "Audio",
];
const VERB_FIELDS: &[&str] = &[
    "ID", "Russian", "Infinitive", "Perfekt", "Example_DE", "Example_RU", "Notes", "Audio",
];
const ADJ_FIELDS: &[&str] = &[
    "ID", "Russian", "Base", "Forms", "Example_DE", "Example_RU", "Notes", "Audio",
];
const PREP_FIELDS: &[&str] = &[
    "ID", "Russian", "Preposition", "Case", "Example_DE", "Example_RU", "Notes", "Audio",
];
const ADV_FIELDS: &[&str] = &[
    "ID", "Russian", "German", "Example_DE", "Example_RU", "Notes", "Audio",
];
const CASE_CLOZE_FIELDS: &[&str] = &[
    "ID", "Cloze_Text", "Case_Gender", "Pattern_Explanation", "Translation_RU", "Notes",
];

macro_rules! example_block {
    () => {
        concat!(
            "<div class=\"example\">",
            "<div class=\"example-de\">{{Example_DE}}</div>",
            "<div class=\"example-ru\">{{Example_RU}}</div>",
            "</div>",
            "<div class=\"notes\">{{Notes}}</div>{{Audio}}"
        )
    };
}

macro_rules! front {
    ($prompt:literal, $hint:literal) => {
        concat!(
            "<div class=\"front\"><div class=\"russian\">",
            $prompt,
            "</div><div class=\"hint\">",
            $hint,
            "</div></div>"
        )
    };
}

macro_rules! back {
    ($answer:literal, $forms:literal) => {
        concat!(
            "<div class=\"back\"><div class=\"german-word\">",
            $answer,
            "</div>",
            $forms,
            "<hr>",
            example_block!(),
            "</div>"
        )
    };
}

const CASE_CLOZE_BACK: &str = concat!(
    "<div class=\"back\">",
    "<div class=\"german-word\" style=\"font-size: 32px;\">{{cloze:Cloze_Text}}</div>",
    "<div class=\"case-info\">{{Case_Gender}}</div>",
    "<div class=\"pattern-explanation\">{{Pattern_Explanation}}</div><hr>",
    "<div class=\"example-ru\" style=\"text-align: center; font-size: 20px;\">{{Translation_RU}}</div>",
    "<div class=\"notes\">{{Notes}}</div>",
    "</div>"
);

const VOCABULARY_CSS: &str = r#".card { font-family: Arial, sans-serif; font-size: 20px; text-align: center; color: #333; background-color: #f9f9f9; padding: 30px; max-width: 600px; margin: 0 auto; }
.front .russian { font-size: 32px; font-weight: bold; color: #2c3e50; margin-bottom: 15px; }
.front .hint { font-size: 16px; color: #7f8c8d; font-style: italic; }
.back .german-word { font-size: 42px; margin-bottom: 15px; line-height: 1.3; color: #2c3e50; font-weight: bold; }
.back .forms { font-size: 24px; color: #34495e; margin-bottom: 20px; line-height: 1.5; }
.gender-m { color: #2196F3; font-weight: bold; margin-right: 8px; }
.gender-f { color: #E91E63; font-weight: bold; margin-right: 8px; }
.gender-n { color: #4CAF50; font-weight: bold; margin-right: 8px; }
hr { border: none; border-top: 2px solid #ecf0f1; margin: 25px 0; }
.example { text-align: left; margin: 20px 0; padding: 15px; background-color: #fff; border-radius: 8px; border-left: 4px solid #3498db; }
.example-de { font-size: 20px; color: #2c3e50; margin-bottom: 8px; font-style: italic; }
.example-ru { font-size: 17px; color: #7f8c8d; }
.notes { font-size: 15px; color: #95a5a6; margin-top: 15px; font-style: italic; }
"#;

const CASES_CSS: &str = r#".card { font-family: Arial, sans-serif; font-size: 20px; text-align: center; color: #333; background-color: #f9f9f9; padding: 30px; max-width: 600px; margin: 0 auto; }
.front .russian { font-size: 32px; font-weight: bold; color: #2c3e50; margin-bottom: 15px; }
.front .hint { font-size: 16px; color: #7f8c8d; font-style: italic; }
.back .german-word { font-size: 42px; margin-bottom: 15px; line-height: 1.3; color: #2c3e50; font-weight: bold; }
.back .case-info { font-size: 20px; color: #34495e; margin-bottom: 20px; line-height: 1.5; }
.case-badge { display: inline-block; padding: 5px 15px; border-radius: 20px; font-weight: bold; margin: 5px; font-size: 16px; }
.case-nominativ { background-color: #3498db; color: white; }
.case-akkusativ { background-color: #e74c3c; color: white; }
.case-dativ { background-color: #2ecc71; color: white; }
.case-genitiv { background-color: #9b59b6; color: white; }
.gender-m { color: #2196F3; font-weight: bold; }
.gender-f { color: #E91E63; font-weight: bold; }
.gender-n { color: #4CAF50; font-weight: bold; }
hr { border: none; border-top: 2px solid #ecf0f1; margin: 25px 0; }
.example { text-align: left; margin: 20px 0; padding: 15px; background-color: #fff; border-radius: 8px; border-left: 4px solid #3498db; }
.example-de { font-size: 20px; color: #2c3e50; margin-bottom: 8px; font-style: italic; }
.example-de strong { color: #2196F3; font-weight: bold; text-decoration: underline; }
.example-ru { font-size: 17px; color: #7f8c8d; }
.notes { font-size: 15px; color: #95a5a6; margin-top: 15px; font-style: italic; text-align: left; }
.pattern-explanation { font-size: 18px; color: #34495e; background-color: #ecf0f1; padding: 10px; border-radius: 5px; margin: 15px 0; }
.cloze { font-weight: bold; color: #2c3e50; }
"#;

const fn standard(
    id: i64,
    name: &'static str,
    fields: &'static [&'static str],
    qfmt: &'static str,
    afmt: &'static str,
    css: &'static str,
) -> NoteModel {
    NoteModel {
        id,
        name,
        kind: ModelKind::Standard,
        fields,
        template_name: "Card",
        qfmt,
        afmt,
        css,
    }
}

const fn cloze(
    id: i64,
    name: &'static str,
    fields: &'static [&'static str],
    qfmt: &'static str,
    afmt: &'static str,
    css: &'static str,
) -> NoteModel {
    NoteModel {
        id,
        name,
        kind: ModelKind::Cloze,
        fields,
        template_name: "Card",
        qfmt,
        afmt,
        css,
    }
}

impl TemplateKey {
    fn family(&self) -> Family {
        match self {
            Self::NounRuDe | Self::NounDeRu => Family::Noun,
            Self::NounCloze => Family::NounCloze,
            Self::VerbRuDe | Self::VerbDeRu => Family::Verb,
            Self::AdjRuDe | Self::AdjDeRu => Family::Adjective,
            Self::PrepRuDe | Self::PrepDeRu => Family::Preposition,
            Self::AdvRuDe | Self::AdvDeRu => Family::Adverb,
            Self::CasePrepRuDe | Self::CasePrepDeRu => Family::CasePreposition,
            Self::DeclensionCloze | Self::CaseIdCloze => Family::CaseCloze,
            Self::TranslationRuDe | Self::TranslationDeRu => Family::Translation,
        }
    }

    fn for_direction(direction: Direction, ru_de: Self, de_ru: Self) -> Self {
        match direction {
            Direction::RuDe => ru_de,
            Direction::DeRu => de_ru,
        }
    }

    pub fn model(&self) -> NoteModel {
        match self {
            Self::NounRuDe => standard(
                1607392319,
                "German Noun (RU→DE)",
                NOUN_FIELDS,
                front!("{{Russian}}", "(существительное)"),
                back!(
                    "<span class=\"gender-{{Gender}}\">{{Article}}</span><span>{{Noun}}</span>",
                    "<div class=\"forms\">Plural: {{Plural}}</div>"
                ),
                VOCABULARY_CSS,
            ),
            Self::NounDeRu => standard(
                1607392320,
                "German Noun (DE→RU)",
                NOUN_FIELDS,
                front!(
                    "<span class=\"gender-{{Gender}}\">{{Article}}</span><span>{{Noun}}</span>",
                    "(существительное)"
                ),
                back!("{{Russian}}", "<div class=\"forms\">Plural: {{Plural}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::NounCloze => cloze(
                1607392321,
                "German Noun Gender Cloze",
                NOUN_CLOZE_FIELDS,
                front!("{{cloze:Cloze_German}}", "(род существительного)"),
                back!("{{cloze:Cloze_German}}", "<div class=\"forms\">Plural: {{Plural}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::VerbRuDe => standard(
                1607392322,
                "German Verb (RU→DE)",
                VERB_FIELDS,
                front!("{{Russian}}", "(глагол)"),
                back!("{{Infinitive}}", "<div class=\"forms\">Perfekt: {{Perfekt}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::VerbDeRu => standard(
                1607392323,
                "German Verb (DE→RU)",
                VERB_FIELDS,
                front!("{{Infinitive}}", "(глагол)"),
                back!("{{Russian}}", "<div class=\"forms\">Perfekt: {{Perfekt}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::AdjRuDe => standard(
                1607392324,
                "German Adjective (RU→DE)",
                ADJ_FIELDS,
                front!("{{Russian}}", "(прилагательное)"),
                back!("{{Base}}", "<div class=\"forms\">{{Forms}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::AdjDeRu => standard(
                1607392325,
                "German Adjective (DE→RU)",
                ADJ_FIELDS,
                front!("{{Base}}", "(прилагательное)"),
                back!("{{Russian}}", "<div class=\"forms\">{{Forms}}</div>"),
                VOCABULARY_CSS,
            ),
            Self::PrepRuDe => standard(
                1607392326,
                "German Preposition (RU→DE)",
                PREP_FIELDS,
                front!("{{Russian}}", "(предлог)"),
                back!("{{Preposition}}", "<div class=\"forms\">({{Case}})</div>"),
                VOCABULARY_CSS,
            ),
            Self::PrepDeRu => standard(
                1607392327,
                "German Preposition (DE→RU)",
                PREP_FIELDS,
                front!("{{Preposition}}", "(предлог • {{Case}})"),
                back!("{{Russian}}", ""),
                VOCABULARY_CSS,
            ),
            Self::AdvRuDe => standard(
                1607392328,
                "German Adverb (RU→DE)",
                ADV_FIELDS,
                front!("{{Russian}}", "(наречие)"),
                back!("{{German}}", ""),
                VOCABULARY_CSS,
            ),
            Self::AdvDeRu => standard(
                1607392329,
                "German Adverb (DE→RU)",
                ADV_FIELDS,
                front!("{{German}}", "(наречие)"),
                back!("{{Russian}}", ""),
                VOCABULARY_CSS,
            ),
            Self::CasePrepRuDe => standard(
                1607392330,
                "German Case Preposition (RU→DE)",
                PREP_FIELDS,
                front!("{{Russian}}", "(предлог + падеж)"),
                back!("{{Preposition}}", "<div class=\"case-info\">{{Case}}</div>"),
                CASES_CSS,
            ),
            Self::CasePrepDeRu => standard(
                1607392334,
                "German Case Preposition (DE→RU)",
                PREP_FIELDS,
                front!("{{Preposition}}", "(предлог • {{Case}})"),
                back!("{{Russian}}", ""),
                CASES_CSS,
            ),
            Self::DeclensionCloze => cloze(
                1607392331,
                "German Case Declension (Cloze)",
                CASE_CLOZE_FIELDS,
                front!("{{cloze:Cloze_Text}}", "(артикль и окончание)"),
                CASE_CLOZE_BACK,
                CASES_CSS,
            ),
            Self::TranslationRuDe => standard(
                1607392332,
                "German Case Translation (RU→DE)",
                ADV_FIELDS,
                front!("{{Russian}}", "(перевод)"),
                concat!(
                    "<div class=\"back\"><div class=\"german-word\" style=\"font-size: 28px;\">{{German}}</div>",
                    "<hr><div class=\"notes\">{{Notes}}</div>{{Audio}}</div>"
                ),
                CASES_CSS,
            ),
            Self::TranslationDeRu => standard(
                1607392335,
                "German Case Translation (DE→RU)",
                ADV_FIELDS,
                front!("{{German}}", "(перевод)"),
                concat!(
                    "<div class=\"back\"><div class=\"german-word\" style=\"font-size: 28px;\">{{Russian}}</div>",
                    "<hr><div class=\"notes\">{{Notes}}</div>{{Audio}}</div>"
                ),
                CASES_CSS,
            ),
            Self::CaseIdCloze => cloze(
                1607392333,
                "German Case Identification (Cloze)",
                CASE_CLOZE_FIELDS,
                front!("{{cloze:Cloze_Text}}", "(падеж)"),
                CASE_CLOZE_BACK,
                CASES_CSS,
            ),
        }
    }
}

/// Why a row produced no note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Vocabulary card type carries neither `RU→DE` nor `DE→RU`.
    NoDirection,
    /// Cases deck card type with no model.
    UnknownCardType,
}

/// A row that was skipped or built with a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    Skipped {
        id: String,
        card_type: String,
        reason: SkipReason,
    },
    /// Noun article is not der/die/das; gender defaulted to `m`.
    UnknownArticle { id: String, article: String },
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped {
                id,
                card_type,
                reason: SkipReason::NoDirection,
            } => write!(f, "card {id}: card type '{card_type}' has no direction marker, skipping"),
            Self::Skipped {
                id,
                card_type,
                reason: SkipReason::UnknownCardType,
            } => write!(f, "card {id}: unknown card type '{card_type}', skipping"),
            Self::UnknownArticle { id, article } => write!(
                f,
                "card {id}: article '{article}' is not der/die/das, gender defaults to 'm'"
            ),
        }
    }
}

/// Pick the model for a row. `Ok(None)` means the row is skipped.
///
/// Invalid word types are an error for the vocabulary deck so the build
/// stops instead of shipping a wrongly typed card.
pub fn resolve_template(
    kind: DeckKind,
    record: &CardRecord,
) -> Result<Option<TemplateKey>, WordTypeError> {
    use TemplateKey::*;

    if kind == DeckKind::Cases {
        return Ok(match record.kind() {
            Some(CardType::PrepositionRuDe) => Some(CasePrepRuDe),
            Some(CardType::PrepositionDeRu) => Some(CasePrepDeRu),
            Some(CardType::DeclensionCloze) => Some(DeclensionCloze),
            Some(CardType::CaseIdCloze) => Some(CaseIdCloze),
            Some(CardType::TranslationRuDe) => Some(TranslationRuDe),
            Some(CardType::TranslationDeRu) => Some(TranslationDeRu),
            _ => None,
        });
    }

    if record.card_type == CardType::Cloze.as_str() {
        return Ok(Some(NounCloze));
    }

    word_type::validate_strict(&record.word_type, &format!("(card {})", record.id))?;
    let category = word_type::model_category(&record.word_type)?;

    let Some(direction) = Direction::from_card_type(&record.card_type) else {
        return Ok(None);
    };

    let (ru_de, de_ru) = match category {
        ModelCategory::Noun => (NounRuDe, NounDeRu),
        ModelCategory::Verb => (VerbRuDe, VerbDeRu),
        ModelCategory::Adjective => (AdjRuDe, AdjDeRu),
        ModelCategory::Preposition => (PrepRuDe, PrepDeRu),
        ModelCategory::Adverb | ModelCategory::Basic | ModelCategory::Pronoun => (AdvRuDe, AdvDeRu),
    };
    Ok(Some(TemplateKey::for_direction(direction, ru_de, de_ru)))
}

/// `[sound:<ref>]`, or empty when there is no audio.
pub fn audio_field(audio_ref: &str) -> String {
    if is_blank(audio_ref) {
        String::new()
    } else {
        format!("[sound:{}]", audio_ref.trim())
    }
}

/// Split `der Hund` into article and noun. Without a space the whole text is
/// the noun.
pub fn split_noun(german: &str) -> (&str, &str) {
    match german.split_once(' ') {
        Some((article, noun)) => (article, noun),
        None => ("", german),
    }
}

/// Gender code for an article, `None` when it is not der/die/das.
pub fn gender_for_article(article: &str) -> Option<&'static str> {
    match article.to_lowercase().as_str() {
        "der" => Some("m"),
        "die" => Some("f"),
        "das" => Some("n"),
        _ => None,
    }
}

/// Note ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltNote {
    /// The row ID, reused so re-imports update instead of duplicating.
    pub guid: String,
    pub template: TemplateKey,
    /// Values in model field order.
    pub fields: Vec<String>,
    /// Raw audio reference from the row, if any.
    pub audio_file: Option<String>,
}

/// Assemble field values for `record` under `template`.
///
/// The second value is set when the gender had to be defaulted.
pub fn note_fields(template: TemplateKey, record: &CardRecord) -> (Vec<String>, Option<BuildWarning>) {
    let r = record;
    let audio = audio_field(&r.audio_ref);
    let mut warning = None;

    macro_rules! owned {
        ($($value:expr),* $(,)?) => {
            vec![$(AsRef::<str>::as_ref($value).to_string()),*]
        };
    }

    let fields = match template.family() {
        Family::Noun => {
            let (article, noun) = split_noun(&r.target_text);
            let gender = gender_for_article(article).unwrap_or_else(|| {
                warning = Some(BuildWarning::UnknownArticle {
                    id: r.id.clone(),
                    article: article.to_string(),
                });
                "m"
            });
            owned![
                &r.id, &r.native_text, article, noun, &r.extra, gender, &r.example_target,
                &r.example_native, &r.notes, &audio,
            ]
        }
        Family::NounCloze => owned![
            &r.id, &r.target_text, &r.extra, &r.example_target, &r.example_native, &r.notes, &audio,
        ],
        Family::Verb | Family::Adjective | Family::Preposition | Family::CasePreposition => owned![
            &r.id, &r.native_text, &r.target_text, &r.extra, &r.example_target, &r.example_native,
            &r.notes, &audio,
        ],
        Family::Adverb | Family::Translation => owned![
            &r.id, &r.native_text, &r.target_text, &r.example_target, &r.example_native, &r.notes,
            &audio,
        ],
        Family::CaseCloze => owned![
            &r.id, &r.target_text, &r.extra, &r.native_text, &r.example_native, &r.notes,
        ],
    };

    (fields, warning)
}

/// Result of building a whole table.
#[derive(Debug, Clone)]
pub struct DeckBuild {
    pub kind: DeckKind,
    pub notes: Vec<BuiltNote>,
    pub warnings: Vec<BuildWarning>,
}

impl DeckBuild {
    pub fn skipped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, BuildWarning::Skipped { .. }))
            .count()
    }

    /// Distinct audio references of the built notes, sorted.
    pub fn audio_files(&self) -> BTreeSet<String> {
        self.notes
            .iter()
            .filter_map(|n| n.audio_file.clone())
            .collect()
    }

    /// Point `[sound:...]` references at their packaged names.
    ///
    /// References missing from `mapping` are left as they are. Returns the
    /// number of fields changed.
    pub fn apply_media_names(&mut self, mapping: &HashMap<String, String>) -> usize {
        let mut changed = 0;
        for note in &mut self.notes {
            for field in &mut note.fields {
                let rewritten = rewrite_sound_refs(field, mapping);
                if rewritten != *field {
                    *field = rewritten;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Models referenced by at least one note, in first-use order.
    pub fn used_templates(&self) -> Vec<TemplateKey> {
        let mut seen = Vec::new();
        for note in &self.notes {
            if !seen.contains(&note.template) {
                seen.push(note.template);
            }
        }
        seen
    }
}

/// Packaged media name for an audio file.
pub fn prefixed_media_name(file: &str) -> String {
    format!("{LANGUAGE_PREFIX}_{file}")
}

/// Replace every `[sound:X]` whose `X` is a key of `mapping`.
pub fn rewrite_sound_refs(field: &str, mapping: &HashMap<String, String>) -> String {
    SOUND_REF
        .replace_all(field, |caps: &regex::Captures| match mapping.get(&caps[1]) {
            Some(name) => format!("[sound:{name}]"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Build notes for every row. Stops at the first invalid word type.
pub fn build_deck(kind: DeckKind, records: &[CardRecord]) -> Result<DeckBuild, WordTypeError> {
    let mut build = DeckBuild {
        kind,
        notes: Vec::with_capacity(records.len()),
        warnings: Vec::new(),
    };

    for record in records {
        let Some(template) = resolve_template(kind, record)? else {
            let reason = match kind {
                DeckKind::Vocabulary => SkipReason::NoDirection,
                DeckKind::Cases => SkipReason::UnknownCardType,
            };
            build.warnings.push(BuildWarning::Skipped {
                id: record.id.clone(),
                card_type: record.card_type.clone(),
                reason,
            });
            continue;
        };

        let (fields, warning) = note_fields(template, record);
        build.warnings.extend(warning);
        build.notes.push(BuiltNote {
            guid: record.id.clone(),
            template,
            fields,
            audio_file: record.audio_file().map(str::to_string),
        });
    }

    Ok(build)
}
