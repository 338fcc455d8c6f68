//! Grammatical word types used by the vocabulary table.
//!
//! The taxonomy is closed and case-sensitive: `"Noun"` is valid, `"noun"`,
//! `"NOUN"` and `"Noun "` are not. The empty string and the placeholder `—`
//! mean "no word type" and are accepted everywhere.
//!
//! [`model_category`] is the only place that turns a word type into a deck
//! template family. Callers must not compare raw word-type strings.

use crate::error::WordTypeError;
use crate::types::PLACEHOLDER;
use serde::{Deserialize, Serialize};

/// A valid word type. Compound variants name words that work as two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Article,
    Pronoun,
    Particle,
    Possessive,
    #[serde(rename = "Question Word")]
    QuestionWord,
    #[serde(rename = "Adjective/Adverb")]
    AdjectiveAdverb,
    #[serde(rename = "Adverb/Particle")]
    AdverbParticle,
}

/// Deck template family derived from a word type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    Noun,
    Verb,
    Adjective,
    Preposition,
    Adverb,
    Basic,
    Pronoun,
}

impl ModelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Preposition => "preposition",
            Self::Adverb => "adverb",
            Self::Basic => "basic",
            Self::Pronoun => "pronoun",
        }
    }
}

impl WordType {
    /// Every member of the taxonomy.
    pub const ALL: [WordType; 13] = [
        Self::Noun,
        Self::Verb,
        Self::Adjective,
        Self::Adverb,
        Self::Preposition,
        Self::Conjunction,
        Self::Article,
        Self::Pronoun,
        Self::Particle,
        Self::Possessive,
        Self::QuestionWord,
        Self::AdjectiveAdverb,
        Self::AdverbParticle,
    ];

    /// The exact table spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "Noun",
            Self::Verb => "Verb",
            Self::Adjective => "Adjective",
            Self::Adverb => "Adverb",
            Self::Preposition => "Preposition",
            Self::Conjunction => "Conjunction",
            Self::Article => "Article",
            Self::Pronoun => "Pronoun",
            Self::Particle => "Particle",
            Self::Possessive => "Possessive",
            Self::QuestionWord => "Question Word",
            Self::AdjectiveAdverb => "Adjective/Adverb",
            Self::AdverbParticle => "Adverb/Particle",
        }
    }

    /// Exact, case-sensitive lookup. No trimming.
    pub fn from_exact(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|wt| wt.as_str() == s)
    }

    /// Slash-separated segments, in table order.
    pub fn segments(&self) -> &'static [WordType] {
        match self {
            Self::AdjectiveAdverb => &[Self::Adjective, Self::Adverb],
            Self::AdverbParticle => &[Self::Adverb, Self::Particle],
            Self::Noun => &[Self::Noun],
            Self::Verb => &[Self::Verb],
            Self::Adjective => &[Self::Adjective],
            Self::Adverb => &[Self::Adverb],
            Self::Preposition => &[Self::Preposition],
            Self::Conjunction => &[Self::Conjunction],
            Self::Article => &[Self::Article],
            Self::Pronoun => &[Self::Pronoun],
            Self::Particle => &[Self::Particle],
            Self::Possessive => &[Self::Possessive],
            Self::QuestionWord => &[Self::QuestionWord],
        }
    }

    /// First segment of the type, e.g. `Adjective` for `Adjective/Adverb`.
    pub fn primary(&self) -> WordType {
        self.segments()[0]
    }

    /// Whether `candidate` is one of the slash-separated segments.
    pub fn contains(&self, candidate: WordType) -> bool {
        self.segments().contains(&candidate)
    }

    pub fn is_noun(&self) -> bool {
        self.primary() == Self::Noun
    }

    pub fn is_verb(&self) -> bool {
        self.primary() == Self::Verb
    }

    pub fn is_adjective(&self) -> bool {
        self.contains(Self::Adjective)
    }

    pub fn is_adverb(&self) -> bool {
        self.contains(Self::Adverb)
    }

    pub fn is_preposition(&self) -> bool {
        self.primary() == Self::Preposition
    }

    pub fn is_article_conjunction_particle(&self) -> bool {
        matches!(
            self.primary(),
            Self::Article | Self::Conjunction | Self::Particle
        )
    }

    pub fn is_pronoun_possessive_question(&self) -> bool {
        matches!(
            self.primary(),
            Self::Pronoun | Self::Possessive | Self::QuestionWord
        )
    }

    /// Template family for this word type.
    ///
    /// Order matters: `Adjective/Adverb` is an adjective, `Adverb/Particle`
    /// an adverb.
    pub fn model_category(&self) -> ModelCategory {
        if self.is_noun() {
            ModelCategory::Noun
        } else if self.is_verb() {
            ModelCategory::Verb
        } else if self.is_adjective() {
            ModelCategory::Adjective
        } else if self.is_preposition() {
            ModelCategory::Preposition
        } else if self.is_adverb() {
            ModelCategory::Adverb
        } else if self.is_article_conjunction_particle() {
            ModelCategory::Basic
        } else if self.is_pronoun_possessive_question() {
            ModelCategory::Pronoun
        } else {
            ModelCategory::Basic
        }
    }
}

impl std::fmt::Display for WordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_unset(s: &str) -> bool {
    s.is_empty() || s.trim() == PLACEHOLDER
}

/// True if `s` is empty, the placeholder, or an exact taxonomy member.
pub fn is_valid(s: &str) -> bool {
    is_unset(s) || WordType::from_exact(s).is_some()
}

/// Strict validation with a targeted hint for the common mistakes.
///
/// `context` is appended to the message, e.g. `"(card 1a2b3c4d)"`.
pub fn validate_strict(s: &str, context: &str) -> Result<(), WordTypeError> {
    parse_strict(s, context).map(|_| ())
}

/// Validate and convert. `Ok(None)` for empty or placeholder input.
pub fn parse_strict(s: &str, context: &str) -> Result<Option<WordType>, WordTypeError> {
    if is_unset(s) {
        return Ok(None);
    }
    if let Some(wt) = WordType::from_exact(s) {
        return Ok(Some(wt));
    }

    let lowered = s.to_lowercase();
    if let Some(wt) = WordType::ALL
        .into_iter()
        .find(|wt| wt.as_str().to_lowercase() == lowered)
    {
        return Err(WordTypeError::CaseMismatch {
            value: s.to_string(),
            context: context.to_string(),
            expected: wt.as_str(),
        });
    }

    if let Some(wt) = WordType::from_exact(s.trim()) {
        return Err(WordTypeError::Whitespace {
            value: s.to_string(),
            context: context.to_string(),
            expected: wt.as_str(),
        });
    }

    let mut valid: Vec<&str> = WordType::ALL.iter().map(|wt| wt.as_str()).collect();
    valid.sort_unstable();
    Err(WordTypeError::Unknown {
        value: s.to_string(),
        context: context.to_string(),
        valid: valid.join(", "),
    })
}

/// First segment of a validated word type, `None` for empty or placeholder.
pub fn primary_type(s: &str) -> Result<Option<WordType>, WordTypeError> {
    Ok(parse_strict(s, "(in primary_type)")?.map(|wt| wt.primary()))
}

/// Whether `candidate` is a segment of `s`. Empty or placeholder never matches.
pub fn contains_type(s: &str, candidate: WordType) -> Result<bool, WordTypeError> {
    Ok(parse_strict(s, "(in contains_type)")?.is_some_and(|wt| wt.contains(candidate)))
}

/// Deck template family for a raw word-type string.
///
/// Empty or placeholder input falls back to [`ModelCategory::Basic`].
pub fn model_category(s: &str) -> Result<ModelCategory, WordTypeError> {
    Ok(parse_strict(s, "(in model_category)")?
        .map(|wt| wt.model_category())
        .unwrap_or(ModelCategory::Basic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_member_round_trips_through_its_spelling() {
        for wt in WordType::ALL {
            assert_eq!(WordType::from_exact(wt.as_str()), Some(wt));
            assert!(is_valid(wt.as_str()));
        }
    }

    #[test]
    fn empty_and_placeholder_are_valid() {
        assert!(is_valid(""));
        assert!(is_valid("—"));
        assert_eq!(parse_strict("—", "").unwrap(), None);
        assert_eq!(primary_type("").unwrap(), None);
        assert!(!contains_type("—", WordType::Noun).unwrap());
    }

    #[test]
    fn validation_is_case_sensitive_and_untrimmed() {
        assert!(!is_valid("noun"));
        assert!(!is_valid("NOUN"));
        assert!(!is_valid("Noun "));
        assert!(!is_valid("adjective/adverb"));
    }

    #[test]
    fn case_mismatch_suggests_correct_spelling() {
        let err = validate_strict("question word", "(row 7)").unwrap_err();
        assert!(matches!(
            err,
            WordTypeError::CaseMismatch { expected: "Question Word", .. }
        ));
        let msg = err.to_string();
        assert!(msg.contains("'question word'"));
        assert!(msg.contains("'Question Word'"));
        assert!(msg.contains("(row 7)"));
    }

    #[test]
    fn whitespace_suggests_trimmed_value() {
        let err = validate_strict(" Verb ", "").unwrap_err();
        assert!(matches!(err, WordTypeError::Whitespace { expected: "Verb", .. }));
        assert!(err.to_string().contains("' Verb '"));
        assert!(err.to_string().contains("'Verb'"));
    }

    #[test]
    fn unknown_value_lists_all_members() {
        let err = validate_strict("Interjection", "").unwrap_err();
        assert_eq!(err.value(), "Interjection");
        let msg = err.to_string();
        for wt in WordType::ALL {
            assert!(msg.contains(wt.as_str()), "missing {wt} in {msg}");
        }
    }

    #[test]
    fn every_member_maps_to_a_category() {
        for wt in WordType::ALL {
            assert_eq!(model_category(wt.as_str()).unwrap(), wt.model_category());
        }
    }

    #[test]
    fn compound_types_use_their_first_segment() {
        assert_eq!(
            model_category("Adjective/Adverb").unwrap(),
            ModelCategory::Adjective
        );
        assert_eq!(
            model_category("Adverb/Particle").unwrap(),
            ModelCategory::Adverb
        );
        assert_eq!(primary_type("Adverb/Particle").unwrap(), Some(WordType::Adverb));
        assert!(contains_type("Adverb/Particle", WordType::Particle).unwrap());
    }

    #[test]
    fn category_buckets() {
        assert_eq!(model_category("Noun").unwrap(), ModelCategory::Noun);
        assert_eq!(model_category("Verb").unwrap(), ModelCategory::Verb);
        assert_eq!(model_category("Preposition").unwrap(), ModelCategory::Preposition);
        assert_eq!(model_category("Conjunction").unwrap(), ModelCategory::Basic);
        assert_eq!(model_category("Article").unwrap(), ModelCategory::Basic);
        assert_eq!(model_category("Possessive").unwrap(), ModelCategory::Pronoun);
        assert_eq!(model_category("Question Word").unwrap(), ModelCategory::Pronoun);
        assert_eq!(model_category("—").unwrap(), ModelCategory::Basic);
    }

    #[test]
    fn helpers_reject_invalid_input() {
        assert!(primary_type("noun").is_err());
        assert!(contains_type("Adverb ", WordType::Adverb).is_err());
        assert!(model_category("Nomen").is_err());
    }
}
