//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised while reading or writing the markdown tables.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not find table header starting with `{prefix}`")]
    HeaderNotFound { prefix: String },

    #[error("table header at line {line} is not followed by a separator row")]
    MissingSeparator { line: usize },

    #[error("card {id}: field {field} contains {found}, which a table row cannot hold")]
    UnrepresentableCell {
        id: String,
        field: &'static str,
        found: &'static str,
    },

    #[error("invalid pending cards: {0}")]
    InvalidPending(String),

    #[error(transparent)]
    WordType(#[from] WordTypeError),
}

/// Strict word-type validation failures.
///
/// Every variant carries the offending literal so the message can be traced
/// back to the row that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordTypeError {
    #[error("Invalid word type: '{value}' {context}\nCase mismatch! Use exact capitalization: '{expected}'")]
    CaseMismatch {
        value: String,
        context: String,
        expected: &'static str,
    },

    #[error("Invalid word type: '{value}' {context}\nExtra whitespace detected! Use: '{expected}'")]
    Whitespace {
        value: String,
        context: String,
        expected: &'static str,
    },

    #[error("Invalid word type: '{value}' {context}\nMust be one of: {valid}")]
    Unknown {
        value: String,
        context: String,
        valid: String,
    },
}

impl WordTypeError {
    /// The literal that failed validation.
    pub fn value(&self) -> &str {
        match self {
            Self::CaseMismatch { value, .. }
            | Self::Whitespace { value, .. }
            | Self::Unknown { value, .. } => value,
        }
    }
}
