/// Local backend adapter
///
/// Stands in for the hosted service so the application runs standalone:
/// - blobs live as plain files under `<root>/blobs/`
/// - the `images` table lives in a bundled-SQLite database
/// - the session is a small JSON file, so it survives restarts
///
/// This is a direct mapping of the collaborator contract onto `std::fs`,
/// `rusqlite` and `serde_json`; it implements no storage logic of its own.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{AuthApi, Backend, ImageRow, ImageTable, ObjectStorage, User};
use crate::error::BackendError;

/// Entry point for the shipped backend implementation
pub struct LocalBackend;

impl LocalBackend {
    /// Open (or create) a local backend rooted at `root`.
    ///
    /// Layout under the root:
    /// - `blobs/`       - object storage
    /// - `gallery.db`   - the `images` metadata table
    /// - `session.json` - current session, if signed in
    pub fn open(root: &Path) -> Result<Backend, BackendError> {
        let blob_dir = root.join("blobs");
        fs::create_dir_all(&blob_dir).map_err(|e| BackendError::Io(e.to_string()))?;

        let conn = Connection::open(root.join("gallery.db"))
            .map_err(|e| BackendError::Table(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Backend {
            storage: Arc::new(LocalStore { blob_dir }),
            images: Arc::new(LocalTable {
                conn: Mutex::new(conn),
            }),
            auth: Arc::new(LocalAuth {
                session_path: root.join("session.json"),
            }),
        })
    }
}

/// Create the `images` table and its listing index if they don't exist
fn init_schema(conn: &Connection) -> Result<(), BackendError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS images (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            storage_path    TEXT NOT NULL UNIQUE,
            created_at      INTEGER NOT NULL,
            user_id         TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| BackendError::Table(e.to_string()))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_images_created_at
         ON images(created_at DESC)",
        [],
    )
    .map_err(|e| BackendError::Table(e.to_string()))?;

    Ok(())
}

/// Object storage backed by a directory of files
struct LocalStore {
    blob_dir: PathBuf,
}

impl ObjectStorage for LocalStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BackendError> {
        fs::write(self.blob_dir.join(path), bytes).map_err(|e| BackendError::Storage(e.to_string()))
    }

    fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
        for path in paths {
            fs::remove_file(self.blob_dir.join(path))
                .map_err(|e| BackendError::Storage(format!("{path}: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.blob_dir.join(path).display().to_string()
    }
}

/// The `images` table in SQLite.
///
/// `Connection` is Send but not Sync, so it sits behind a mutex; every
/// call is short and runs on a background task anyway.
struct LocalTable {
    conn: Mutex<Connection>,
}

impl LocalTable {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, BackendError> {
        self.conn
            .lock()
            .map_err(|_| BackendError::Table("connection lock poisoned".into()))
    }
}

impl ImageTable for LocalTable {
    fn insert(&self, storage_path: &str, user_id: &str) -> Result<(), BackendError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO images (storage_path, created_at, user_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![storage_path, Utc::now().timestamp(), user_id],
        )
        .map_err(|e| BackendError::Table(e.to_string()))?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<ImageRow>, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, storage_path, created_at, user_id FROM images
                 ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| BackendError::Table(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let secs: i64 = row.get(2)?;
                Ok(ImageRow {
                    id: row.get(0)?,
                    storage_path: row.get(1)?,
                    created_at: DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH),
                    user_id: row.get(3)?,
                })
            })
            .map_err(|e| BackendError::Table(e.to_string()))?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row.map_err(|e| BackendError::Table(e.to_string()))?);
        }
        Ok(images)
    }

    fn delete(&self, id: i64) -> Result<(), BackendError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM images WHERE id = ?1", rusqlite::params![id])
            .map_err(|e| BackendError::Table(e.to_string()))?;
        Ok(())
    }
}

/// Session persistence via a JSON file in the backend root
struct LocalAuth {
    session_path: PathBuf,
}

impl AuthApi for LocalAuth {
    fn current_user(&self) -> Result<Option<User>, BackendError> {
        match fs::read_to_string(&self.session_path) {
            Ok(json) => {
                let user =
                    serde_json::from_str(&json).map_err(|e| BackendError::Auth(e.to_string()))?;
                Ok(Some(user))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Auth(e.to_string())),
        }
    }

    fn sign_in(&self) -> Result<User, BackendError> {
        // Re-use a live session instead of minting a second identity
        if let Some(user) = self.current_user()? {
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
        };
        let json =
            serde_json::to_string_pretty(&user).map_err(|e| BackendError::Auth(e.to_string()))?;
        fs::write(&self.session_path, json).map_err(|e| BackendError::Auth(e.to_string()))?;
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), BackendError> {
        match fs::remove_file(&self.session_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Auth(e.to_string())),
        }
    }
}
