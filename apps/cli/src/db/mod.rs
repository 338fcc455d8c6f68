//! Anki collection databases.

pub mod collection;
pub mod error;
pub mod schema;

pub use collection::{CollectionContents, CollectionReader, CollectionWriter, ModelSchema, SchemaGeneration, WriteSummary};
pub use error::DbError;
