use thiserror::Error;

/// Failures reading or writing an Anki collection.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column of `col` (models, decks, conf) did not parse.
    #[error("malformed collection JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("col.{column} has a non-numeric id key '{key}'")]
    BadIdKey { column: &'static str, key: String },
}
