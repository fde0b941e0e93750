/// Gallery data service
///
/// Mediates between the UI and the backend collaborator: fetches the
/// listing (with its public URLs), uploads batches, deletes images and
/// manages the session. The only cache in the system lives here: a single
/// slot holding the last successful listing, cleared unconditionally after
/// every mutation. No TTL, no size bound, no partial updates.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task;
use uuid::Uuid;

use crate::backend::{Backend, User};
use crate::error::{BackendError, GalleryError};
use crate::gallery::data::{GalleryImage, UploadFailure, UploadReport};

/// Which step of the delete flow failed
enum DeleteFailure {
    /// Blob removal failed; the metadata row was not touched
    Blob(BackendError),
    /// Blob removal succeeded but the row delete failed; the blob
    /// is now orphaned
    Row(BackendError),
}

/// Cheap-to-clone handle; clones share the backend and the cache
#[derive(Clone)]
pub struct GalleryService {
    backend: Backend,
    cache: Arc<Mutex<Option<Vec<GalleryImage>>>>,
}

impl GalleryService {
    /// Create a service with an empty listing cache
    pub fn new(backend: Backend) -> Self {
        GalleryService {
            backend,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Drop the cached listing so the next `list_images` hits the backend.
    /// Idempotent: invalidating twice behaves exactly like invalidating once.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.cache.lock() {
            *slot = None;
        }
    }

    fn cached(&self) -> Option<Vec<GalleryImage>> {
        self.cache.lock().ok()?.clone()
    }

    fn store(&self, images: &[GalleryImage]) {
        if let Ok(mut slot) = self.cache.lock() {
            *slot = Some(images.to_vec());
        }
    }

    /// All images visible to the current session, newest first, each
    /// resolved to its public URL. Served from the cache when one is held.
    pub async fn list_images(&self) -> Result<Vec<GalleryImage>, GalleryError> {
        if let Some(images) = self.cached() {
            return Ok(images);
        }

        let backend = self.backend.clone();
        let rows = task::spawn_blocking(move || backend.images.list_all())
            .await
            .map_err(GalleryError::unavailable)?
            .map_err(GalleryError::unavailable)?;

        let images: Vec<GalleryImage> = rows
            .into_iter()
            .map(|row| GalleryImage {
                url: self.backend.storage.public_url(&row.storage_path),
                id: row.id,
                storage_path: row.storage_path,
                created_at: row.created_at,
            })
            .collect();

        self.store(&images);
        Ok(images)
    }

    /// Upload a batch of local files.
    ///
    /// Files are independent: each one is stored and recorded on its own
    /// concurrently-running task, so some may succeed while others fail.
    /// Successes stay committed; there is no rollback. The listing cache
    /// is invalidated once the whole batch has settled, success or not.
    pub async fn upload_images(&self, files: Vec<PathBuf>) -> UploadReport {
        let user = match self.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return Self::reject_batch(files, &GalleryError::NotSignedIn),
            Err(e) => return Self::reject_batch(files, &e),
        };

        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            let backend = self.backend.clone();
            let user_id = user.id.clone();
            let handle = tokio::spawn(upload_one(backend, file.clone(), user_id));
            handles.push((file, handle));
        }

        let mut report = UploadReport::default();
        for (file, handle) in handles {
            match handle.await {
                Ok(Ok(url)) => report.uploaded.push(url),
                Ok(Err(e)) => report.failures.push(UploadFailure {
                    file,
                    reason: e.to_string(),
                }),
                Err(e) => report.failures.push(UploadFailure {
                    file,
                    reason: e.to_string(),
                }),
            }
        }

        self.invalidate();
        report
    }

    /// Fail every file in the batch with the same reason
    fn reject_batch(files: Vec<PathBuf>, reason: &GalleryError) -> UploadReport {
        UploadReport {
            uploaded: Vec::new(),
            failures: files
                .into_iter()
                .map(|file| UploadFailure {
                    file,
                    reason: reason.to_string(),
                })
                .collect(),
        }
    }

    /// Delete one image: blob first, then the metadata row.
    ///
    /// If blob removal fails, the row is left untouched and the whole
    /// operation fails; the record must never point at a blob that was
    /// reported deleted. If the row delete fails after the blob is gone,
    /// the orphaned blob is surfaced as `OrphanedBlob` with no automatic
    /// compensation.
    pub async fn delete_image(&self, storage_path: String, id: i64) -> Result<(), GalleryError> {
        let backend = self.backend.clone();
        let path = storage_path.clone();

        let result = task::spawn_blocking(move || {
            backend
                .storage
                .remove(&[path])
                .map_err(DeleteFailure::Blob)?;
            backend.images.delete(id).map_err(DeleteFailure::Row)
        })
        .await
        .map_err(GalleryError::unavailable)?;

        match result {
            Ok(()) => {
                self.invalidate();
                Ok(())
            }
            Err(DeleteFailure::Blob(e)) => Err(GalleryError::unavailable(e)),
            Err(DeleteFailure::Row(_)) => Err(GalleryError::OrphanedBlob { path: storage_path }),
        }
    }

    /// The signed-in user, if any
    pub async fn current_user(&self) -> Result<Option<User>, GalleryError> {
        let backend = self.backend.clone();
        task::spawn_blocking(move || backend.auth.current_user())
            .await
            .map_err(GalleryError::unavailable)?
            .map_err(GalleryError::unavailable)
    }

    /// Establish a session through the backend's own mechanism
    pub async fn sign_in(&self) -> Result<User, GalleryError> {
        let backend = self.backend.clone();
        task::spawn_blocking(move || backend.auth.sign_in())
            .await
            .map_err(GalleryError::unavailable)?
            .map_err(GalleryError::unavailable)
    }

    /// Terminate the session. On success the listing cache is cleared as
    /// part of teardown; on failure the session and cache are left intact.
    pub async fn sign_out(&self) -> Result<(), GalleryError> {
        let backend = self.backend.clone();
        task::spawn_blocking(move || backend.auth.sign_out())
            .await
            .map_err(|e| GalleryError::LogoutFailure(e.to_string()))?
            .map_err(|e| GalleryError::LogoutFailure(e.to_string()))?;

        self.invalidate();
        Ok(())
    }
}

/// Store one file and record it: fresh storage path, blob write, then
/// the metadata row. Runs as its own task per file in the batch.
async fn upload_one(
    backend: Backend,
    file: PathBuf,
    user_id: String,
) -> Result<String, BackendError> {
    let storage_path = fresh_storage_path(&file);

    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| BackendError::Io(e.to_string()))?;

    let b = backend.clone();
    let path = storage_path.clone();
    task::spawn_blocking(move || {
        b.storage.put(&path, &bytes)?;
        b.images.insert(&path, &user_id)
    })
    .await
    .map_err(|e| BackendError::Io(e.to_string()))??;

    Ok(backend.storage.public_url(&storage_path))
}

/// Random identifier plus the original extension, lowercased
fn fresh_storage_path(file: &std::path::Path) -> String {
    match file.extension() {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_string_lossy().to_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthApi, ImageRow, ImageTable, ObjectStorage};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    /// In-memory object storage with injectable failures
    #[derive(Default)]
    struct MemoryStorage {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
        /// Any `put` of exactly these bytes fails mid-write
        reject_bytes: Option<Vec<u8>>,
        fail_remove: bool,
    }

    impl ObjectStorage for MemoryStorage {
        fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BackendError> {
            if self.reject_bytes.as_deref() == Some(bytes) {
                return Err(BackendError::Storage("write interrupted".into()));
            }
            self.blobs
                .lock()
                .unwrap()
                .insert(path.to_string(), bytes.to_vec());
            Ok(())
        }

        fn remove(&self, paths: &[String]) -> Result<(), BackendError> {
            if self.fail_remove {
                return Err(BackendError::Storage("remove refused".into()));
            }
            let mut blobs = self.blobs.lock().unwrap();
            for path in paths {
                blobs
                    .remove(path)
                    .ok_or_else(|| BackendError::Storage(format!("{path}: no such blob")))?;
            }
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("mem://gallery/{path}")
        }
    }

    /// In-memory `images` table; `list_all` sorts like the real backend
    #[derive(Default)]
    struct MemoryTable {
        rows: Mutex<Vec<ImageRow>>,
        next_id: AtomicI64,
        list_calls: AtomicUsize,
        fail_delete: bool,
    }

    impl MemoryTable {
        fn push_row(&self, storage_path: &str, created_at: DateTime<Utc>) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.rows.lock().unwrap().push(ImageRow {
                id,
                storage_path: storage_path.to_string(),
                created_at,
                user_id: "u1".into(),
            });
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl ImageTable for MemoryTable {
        fn insert(&self, storage_path: &str, _user_id: &str) -> Result<(), BackendError> {
            self.push_row(storage_path, Utc::now());
            Ok(())
        }

        fn list_all(&self) -> Result<Vec<ImageRow>, BackendError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            Ok(rows)
        }

        fn delete(&self, id: i64) -> Result<(), BackendError> {
            if self.fail_delete {
                return Err(BackendError::Table("delete refused".into()));
            }
            self.rows.lock().unwrap().retain(|row| row.id != id);
            Ok(())
        }
    }

    /// Auth fake: starts signed in unless told otherwise
    struct MemoryAuth {
        user: Mutex<Option<User>>,
        fail_sign_out: bool,
    }

    impl Default for MemoryAuth {
        fn default() -> Self {
            MemoryAuth {
                user: Mutex::new(Some(User { id: "u1".into() })),
                fail_sign_out: false,
            }
        }
    }

    impl AuthApi for MemoryAuth {
        fn current_user(&self) -> Result<Option<User>, BackendError> {
            Ok(self.user.lock().unwrap().clone())
        }

        fn sign_in(&self) -> Result<User, BackendError> {
            let user = User { id: "u1".into() };
            *self.user.lock().unwrap() = Some(user.clone());
            Ok(user)
        }

        fn sign_out(&self) -> Result<(), BackendError> {
            if self.fail_sign_out {
                return Err(BackendError::Auth("session server unreachable".into()));
            }
            *self.user.lock().unwrap() = None;
            Ok(())
        }
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        table: Arc<MemoryTable>,
        service: GalleryService,
    }

    fn fixture(storage: MemoryStorage, table: MemoryTable, auth: MemoryAuth) -> Fixture {
        let storage = Arc::new(storage);
        let table = Arc::new(table);
        let backend = Backend {
            storage: storage.clone(),
            images: table.clone(),
            auth: Arc::new(auth),
        };
        Fixture {
            storage,
            table,
            service: GalleryService::new(backend),
        }
    }

    fn write_files(dir: &std::path::Path, contents: &[&[u8]]) -> Vec<PathBuf> {
        contents
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let path = dir.join(format!("photo{i}.jpg"));
                std::fs::write(&path, bytes).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_upload_batch_commits_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(dir.path(), &[b"one", b"two", b"three"]);
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );

        let report = f.service.upload_images(files).await;

        assert_eq!(report.uploaded.len(), 3);
        assert!(report.failures.is_empty());
        assert_eq!(f.service.list_images().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_partial_upload_keeps_successes() {
        let dir = tempfile::tempdir().unwrap();
        // The middle file's bytes are rejected mid-write by the storage fake
        let files = write_files(dir.path(), &[b"good one", b"bad", b"good two"]);
        let storage = MemoryStorage {
            reject_bytes: Some(b"bad".to_vec()),
            ..Default::default()
        };
        let f = fixture(storage, MemoryTable::default(), MemoryAuth::default());

        let report = f.service.upload_images(files.clone()).await;

        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, files[1]);
        assert_eq!(report.total(), 3);

        // Exactly the two successes appear in the next listing
        let images = f.service.list_images().await.unwrap();
        assert_eq!(images.len(), 2);
        // And no row was written for the failed blob
        assert_eq!(f.table.row_count(), 2);
    }

    #[tokio::test]
    async fn test_upload_without_session_fails_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(dir.path(), &[b"one", b"two"]);
        let auth = MemoryAuth {
            user: Mutex::new(None),
            ..Default::default()
        };
        let f = fixture(MemoryStorage::default(), MemoryTable::default(), auth);

        let report = f.service.upload_images(files).await;

        assert!(report.uploaded.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(f.table.row_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_unreadable_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-there.png");
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );

        let report = f.service.upload_images(vec![missing.clone()]).await;

        assert!(report.uploaded.is_empty());
        assert_eq!(report.failures[0].file, missing);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );
        let base = Utc::now();
        // Deliberately shuffled insertion order
        f.table.push_row("middle.jpg", base - Duration::minutes(5));
        f.table.push_row("newest.jpg", base);
        f.table.push_row("oldest.jpg", base - Duration::minutes(10));

        let images = f.service.list_images().await.unwrap();
        let paths: Vec<_> = images.iter().map(|i| i.storage_path.as_str()).collect();
        assert_eq!(paths, vec!["newest.jpg", "middle.jpg", "oldest.jpg"]);
    }

    #[tokio::test]
    async fn test_listing_resolves_public_urls() {
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );
        f.table.push_row("a.jpg", Utc::now());

        let images = f.service.list_images().await.unwrap();
        assert_eq!(images[0].url, "mem://gallery/a.jpg");
    }

    #[tokio::test]
    async fn test_listing_served_from_cache_until_invalidated() {
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );
        f.table.push_row("a.jpg", Utc::now());

        f.service.list_images().await.unwrap();
        f.service.list_images().await.unwrap();
        assert_eq!(f.table.list_calls.load(Ordering::SeqCst), 1);

        // Invalidating twice behaves the same as once: one more fetch
        f.service.invalidate();
        f.service.invalidate();
        f.service.list_images().await.unwrap();
        f.service.list_images().await.unwrap();
        assert_eq!(f.table.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_upload_invalidates_listing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(dir.path(), &[b"one"]);
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );

        assert_eq!(f.service.list_images().await.unwrap().len(), 0);
        f.service.upload_images(files).await;
        assert_eq!(f.service.list_images().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_blob_then_row() {
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );
        f.storage.put("a.jpg", b"bytes").unwrap();
        f.table.push_row("a.jpg", Utc::now());
        let id = f.table.rows.lock().unwrap()[0].id;

        f.service.delete_image("a.jpg".into(), id).await.unwrap();

        assert!(f.storage.blobs.lock().unwrap().is_empty());
        assert_eq!(f.table.row_count(), 0);
        assert!(f.service.list_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_blob_failure_leaves_row() {
        let storage = MemoryStorage {
            fail_remove: true,
            ..Default::default()
        };
        let f = fixture(storage, MemoryTable::default(), MemoryAuth::default());
        f.storage.blobs.lock().unwrap().insert("a.jpg".into(), b"bytes".to_vec());
        f.table.push_row("a.jpg", Utc::now());
        let id = f.table.rows.lock().unwrap()[0].id;

        // Prime the cache so we can check it is NOT invalidated on failure
        f.service.list_images().await.unwrap();

        let err = f.service.delete_image("a.jpg".into(), id).await.unwrap_err();
        assert!(matches!(err, GalleryError::BackendUnavailable(_)));
        assert_eq!(f.table.row_count(), 1);

        f.service.list_images().await.unwrap();
        assert_eq!(f.table.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_row_failure_surfaces_orphaned_blob() {
        let table = MemoryTable {
            fail_delete: true,
            ..Default::default()
        };
        let f = fixture(MemoryStorage::default(), table, MemoryAuth::default());
        f.storage.put("a.jpg", b"bytes").unwrap();
        f.table.push_row("a.jpg", Utc::now());
        let id = f.table.rows.lock().unwrap()[0].id;

        let err = f.service.delete_image("a.jpg".into(), id).await.unwrap_err();
        assert!(matches!(err, GalleryError::OrphanedBlob { ref path } if path == "a.jpg"));

        // The blob is gone, the row remains: surfaced, not repaired
        assert!(f.storage.blobs.lock().unwrap().is_empty());
        assert_eq!(f.table.row_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_cache() {
        let f = fixture(
            MemoryStorage::default(),
            MemoryTable::default(),
            MemoryAuth::default(),
        );
        f.service.list_images().await.unwrap();

        f.service.sign_out().await.unwrap();
        assert!(f.service.current_user().await.unwrap().is_none());

        f.service.list_images().await.unwrap();
        assert_eq!(f.table.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session_and_cache() {
        let auth = MemoryAuth {
            fail_sign_out: true,
            ..Default::default()
        };
        let f = fixture(MemoryStorage::default(), MemoryTable::default(), auth);
        f.service.list_images().await.unwrap();

        let err = f.service.sign_out().await.unwrap_err();
        assert!(matches!(err, GalleryError::LogoutFailure(_)));
        assert!(f.service.current_user().await.unwrap().is_some());

        f.service.list_images().await.unwrap();
        assert_eq!(f.table.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fresh_storage_path_keeps_lowercased_extension() {
        let path = fresh_storage_path(std::path::Path::new("/tmp/Shot.JPG"));
        assert!(path.ends_with(".jpg"));
        assert!(path.len() > ".jpg".len());

        let bare = fresh_storage_path(std::path::Path::new("/tmp/noext"));
        assert!(!bare.contains('.'));
    }
}
