/// Shared data structures for the gallery
///
/// These structs represent the data model that flows between
/// the gallery service and the UI layer.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// The client-visible view of one stored image
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryImage {
    /// Backend-assigned unique id
    pub id: i64,
    /// Key of the blob in object storage
    pub storage_path: String,
    /// Publicly resolvable address of the blob, derived on read
    /// from `storage_path` and never stored
    pub url: String,
    /// Backend-assigned insertion timestamp
    pub created_at: DateTime<Utc>,
}

/// Outcome of one upload batch.
///
/// Files in a batch succeed or fail independently: successes stay
/// committed and each failure is reported on its own. A partially
/// failed batch is not an error of the batch.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Public URLs of the files that were fully committed
    pub uploaded: Vec<String>,
    /// One entry per file that failed, in no particular order
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    /// Total number of attempted files in the batch
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failures.len()
    }
}

/// A single failed file within an upload batch
#[derive(Debug, Clone)]
pub struct UploadFailure {
    /// The local file that could not be uploaded
    pub file: PathBuf,
    pub reason: String,
}
