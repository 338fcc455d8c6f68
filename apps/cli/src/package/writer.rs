use super::{PackageError, LEGACY_COLLECTION, MEDIA_MANIFEST};
use crate::db::{CollectionWriter, WriteSummary};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vocab_core::template::prefixed_media_name;
use vocab_core::DeckBuild;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A media file to bundle, under its packaged name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub path: PathBuf,
}

/// Audio references split into files found on disk and files missing.
#[derive(Debug, Clone, Default)]
pub struct MediaPlan {
    pub files: Vec<MediaFile>,
    /// Original reference to packaged name.
    pub mapping: HashMap<String, String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageSummary {
    pub collection: WriteSummary,
    pub media_files: usize,
}

/// Locate every audio file the build references.
///
/// `locate` maps a raw reference to a file on disk.
pub fn collect_media<F>(build: &DeckBuild, locate: F) -> MediaPlan
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let mut plan = MediaPlan::default();
    for file in build.audio_files() {
        match locate(&file) {
            Some(path) => {
                let name = prefixed_media_name(&file);
                debug!("media {} -> {}", file, name);
                plan.mapping.insert(file, name.clone());
                plan.files.push(MediaFile { name, path });
            }
            None => plan.missing.push(file),
        }
    }
    plan
}

/// Write `build` and `media` as a package at `output`.
///
/// The zip is assembled next to `output` and renamed into place.
pub fn write_package(
    output: &Path,
    build: &DeckBuild,
    media: &[MediaFile],
    created: DateTime<Utc>,
) -> Result<PackageSummary, PackageError> {
    let scratch = tempfile::tempdir()?;
    let collection_path = scratch.path().join(LEGACY_COLLECTION);
    let collection = {
        let mut writer = CollectionWriter::create(&collection_path)?;
        writer.write_deck(build, created)?
    };

    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let staging = tempfile::NamedTempFile::new_in(&parent)?;

    let mut zip = ZipWriter::new(staging.as_file().try_clone()?);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(LEGACY_COLLECTION, options)?;
    zip.write_all(&fs::read(&collection_path)?)?;

    let mut manifest = BTreeMap::new();
    for (index, file) in media.iter().enumerate() {
        let entry = index.to_string();
        zip.start_file(entry.as_str(), options)?;
        let mut source = File::open(&file.path)?;
        std::io::copy(&mut source, &mut zip)?;
        manifest.insert(entry, file.name.clone());
    }

    zip.start_file(MEDIA_MANIFEST, options)?;
    zip.write_all(serde_json::to_string(&manifest)?.as_bytes())?;
    zip.finish()?;

    staging.as_file().sync_all()?;
    staging.persist(output).map_err(|e| e.error)?;
    info!(
        "wrote {} ({} notes, {} cards, {} media files)",
        output.display(),
        collection.notes,
        collection.cards,
        media.len()
    );

    Ok(PackageSummary {
        collection,
        media_files: media.len(),
    })
}
