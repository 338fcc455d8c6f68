use super::{PackageError, LEGACY_COLLECTION, MODERN_COLLECTION};
use crate::db::{CollectionReader, SchemaGeneration};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vocab_core::UnpackedDeck;
use zip::ZipArchive;

/// Result of unpacking one package.
#[derive(Debug, Clone)]
pub struct UnpackOutcome {
    pub deck: UnpackedDeck,
    pub generation: SchemaGeneration,
    /// `(note id, model id)` of notes skipped for an undefined model.
    pub unknown_models: Vec<(i64, i64)>,
}

/// Read every note of the package at `path`.
///
/// `extracted_at` is stored verbatim in the result.
pub fn unpack(path: &Path, extracted_at: &str) -> Result<UnpackOutcome, PackageError> {
    let scratch = tempfile::tempdir()?;
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(scratch.path())?;
    info!("extracted {} to {}", path.display(), scratch.path().display());

    let collection = choose_collection(scratch.path())?;
    let reader = CollectionReader::open(&collection)?;
    let generation = reader.generation()?;
    let contents = reader.read()?;

    for (note_id, model_id) in &contents.unknown_models {
        warn!("note {}: unknown model ID {}, skipping", note_id, model_id);
    }
    info!("found {} notes", contents.cards.len());

    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UnpackOutcome {
        deck: UnpackedDeck {
            source_file,
            extracted_at: extracted_at.to_string(),
            decks: contents.decks,
            total_cards: contents.cards.len(),
            cards: contents.cards,
        },
        generation,
        unknown_models: contents.unknown_models,
    })
}

/// Prefer the compressed modern collection, falling back to the legacy one.
fn choose_collection(dir: &Path) -> Result<PathBuf, PackageError> {
    let modern = dir.join(MODERN_COLLECTION);
    if modern.is_file() {
        match decompress(&modern, &dir.join("collection_decompressed.anki2")) {
            Ok(path) => {
                info!("using {} (decompressed)", MODERN_COLLECTION);
                return Ok(path);
            }
            Err(e) => warn!(
                "cannot read {}: {}; falling back to {} (may have incomplete data)",
                MODERN_COLLECTION, e, LEGACY_COLLECTION
            ),
        }
    }

    let legacy = dir.join(LEGACY_COLLECTION);
    if legacy.is_file() {
        info!("using {}", LEGACY_COLLECTION);
        Ok(legacy)
    } else {
        Err(PackageError::MissingCollection)
    }
}

#[cfg(feature = "zstd")]
fn decompress(source: &Path, target: &Path) -> Result<PathBuf, PackageError> {
    use std::io::{BufReader, BufWriter, Write};

    let input = BufReader::new(File::open(source)?);
    let mut output = BufWriter::new(File::create(target)?);
    zstd::stream::copy_decode(input, &mut output)?;
    output.flush()?;
    Ok(target.to_path_buf())
}

#[cfg(not(feature = "zstd"))]
fn decompress(_source: &Path, _target: &Path) -> Result<PathBuf, PackageError> {
    Err(PackageError::ZstdUnavailable)
}
