//! Core vocabulary library shared by the command-line tools.
//!
//! Provides:
//! - Word-type taxonomy and strict validation
//! - Markdown table codec for the vocabulary and tracking tables
//! - Note models and card-to-note field assembly for both decks
//! - Pending-card expansion and ID assignment
//! - Word tracking refresh
//! - Consistency checks between the source table and an unpacked deck
//!
//! Nothing here touches the filesystem; callers pass content and lookups in.

pub mod error;
pub mod pending;
pub mod table;
pub mod template;
pub mod tracking;
pub mod types;
pub mod validate;
pub mod word_type;

pub use error::{ParseError, Result, WordTypeError};
pub use table::{parse_cards, render_row, CardTable, RowWarning};
pub use template::{build_deck, BuildWarning, BuiltNote, DeckBuild, DeckKind, NoteModel, TemplateKey};
pub use types::{
    CardRecord, CardType, DeckInfo, Direction, FieldMap, TrackingEntry, TrackingStatus, UnpackedCard,
    UnpackedDeck, PLACEHOLDER,
};
pub use validate::{validate, ValidationReport};
pub use word_type::{ModelCategory, WordType};
