//! `.apkg` packages: a zip holding the collection database, a media
//! manifest and numbered media files.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::PackageError;
pub use reader::{unpack, UnpackOutcome};
pub use writer::{collect_media, write_package, MediaFile, MediaPlan, PackageSummary};

pub const LEGACY_COLLECTION: &str = "collection.anki2";
pub const MODERN_COLLECTION: &str = "collection.anki21b";
pub const MEDIA_MANIFEST: &str = "media";
