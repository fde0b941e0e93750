/// Backend collaborator contract
///
/// All persistence is delegated to a backend reached through three traits:
/// - `ObjectStorage` - binary blobs keyed by path
/// - `ImageTable`    - the `images` metadata table
/// - `AuthApi`       - session-based authentication
///
/// The traits mirror the hosted service's client surface. `local.rs`
/// provides the shipped implementation (filesystem + SQLite + session
/// file); tests substitute in-memory fakes. Trait objects are
/// `Send + Sync` so calls can run on background tasks.

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BackendError;

/// One row of the `images` metadata table, as stored by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRow {
    /// Backend-assigned unique id
    pub id: i64,
    /// Unique key of the underlying blob in object storage
    pub storage_path: String,
    /// Backend-assigned insertion timestamp
    pub created_at: DateTime<Utc>,
    /// Id of the user who created the row
    pub user_id: String,
}

/// The authenticated user, as reported by the backend's auth client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

/// Binary blob storage keyed by path
pub trait ObjectStorage: Send + Sync {
    /// Write a blob under `path`. `path` is expected to be fresh.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BackendError>;

    /// Remove the blobs at the given paths
    fn remove(&self, paths: &[String]) -> Result<(), BackendError>;

    /// Derive the publicly resolvable address of a blob.
    /// Pure derivation from the path, no network round-trip.
    fn public_url(&self, path: &str) -> String;
}

/// The `images` metadata table
pub trait ImageTable: Send + Sync {
    /// Insert a row for a freshly stored blob. The backend assigns
    /// `id` and `created_at`.
    fn insert(&self, storage_path: &str, user_id: &str) -> Result<(), BackendError>;

    /// All rows visible to the current session, newest first
    /// (`created_at` descending, ties broken by `id` descending)
    fn list_all(&self) -> Result<Vec<ImageRow>, BackendError>;

    /// Delete the row with the given id
    fn delete(&self, id: i64) -> Result<(), BackendError>;
}

/// Session-based authentication
pub trait AuthApi: Send + Sync {
    /// The currently signed-in user, if any
    fn current_user(&self) -> Result<Option<User>, BackendError>;

    /// Establish a session using the backend's own mechanism
    fn sign_in(&self) -> Result<User, BackendError>;

    /// Terminate the current session
    fn sign_out(&self) -> Result<(), BackendError>;
}

/// Handle bundling the three collaborator clients.
/// Cheap to clone; clones share the underlying clients.
#[derive(Clone)]
pub struct Backend {
    pub storage: Arc<dyn ObjectStorage>,
    pub images: Arc<dyn ImageTable>,
    pub auth: Arc<dyn AuthApi>,
}
