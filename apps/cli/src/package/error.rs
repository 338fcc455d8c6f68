//! Package error types.

use crate::db::DbError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("malformed media manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("package contains no collection database")]
    MissingCollection,

    #[error("zstd support is not compiled in")]
    ZstdUnavailable,
}
