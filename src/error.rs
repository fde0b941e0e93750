/// Error types shared across the application
///
/// Backend calls fail with `BackendError`; the gallery service converts
/// those into `GalleryError` at its boundary. Both carry their payloads
/// as strings so values stay `Clone` and can travel inside iced messages.

use thiserror::Error;

/// Failure of a single backend collaborator call
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Object storage call failed (put/remove)
    #[error("object storage: {0}")]
    Storage(String),

    /// Metadata table call failed (insert/list/delete)
    #[error("metadata table: {0}")]
    Table(String),

    /// Auth call failed (current user/sign in/sign out)
    #[error("auth: {0}")]
    Auth(String),

    /// Local I/O failed before the backend was even reached
    #[error("io: {0}")]
    Io(String),
}

/// User-visible failure of a gallery operation
///
/// Per-file upload failures are not represented here: a partially failed
/// batch is reported through `UploadReport`, not as an error of the batch.
#[derive(Debug, Clone, Error)]
pub enum GalleryError {
    /// A read or write against the backend failed outright
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The blob was removed but its metadata row could not be deleted.
    /// Surfaced to the user, never auto-repaired.
    #[error("image removed from storage but its record remains ({path})")]
    OrphanedBlob { path: String },

    /// Session termination failed; the session is left intact
    #[error("logout failed: {0}")]
    LogoutFailure(String),

    /// An operation that requires a session ran without one
    #[error("no signed-in session")]
    NotSignedIn,
}

impl GalleryError {
    /// Wrap a backend failure as a plain availability error
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        GalleryError::BackendUnavailable(err.to_string())
    }
}
