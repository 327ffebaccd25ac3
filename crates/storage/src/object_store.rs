//! Bucket/key object storage. The job reads its input and writes its result
//! through this trait so hosts can plug in any backend.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use keyword_core::error::{KeywordError, KeywordResult};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> KeywordResult<Bytes>;

    /// Create or replace an object.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> KeywordResult<()>;
}

fn retrieval_error(bucket: &str, key: &str, reason: impl ToString) -> KeywordError {
    KeywordError::Retrieval {
        bucket: bucket.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Stores `bucket/key` at `<root>/<bucket>/<key>`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!(root = %root.display(), "Using local object store");
        Self { root }
    }

    fn object_path(&self, bucket: &str, key: &str) -> KeywordResult<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let escapes = bucket.is_empty()
            || key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(retrieval_error(bucket, key, "invalid bucket or key"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> KeywordResult<Bytes> {
        let path = self.object_path(bucket, key)?;
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| retrieval_error(bucket, key, e))?;

        metrics::counter!("storage.objects_read").increment(1);
        debug!(path = %path.display(), bytes = body.len(), "Read object");
        Ok(Bytes::from(body))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> KeywordResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;

        metrics::counter!("storage.objects_written").increment(1);
        debug!(path = %path.display(), bytes = body.len(), "Wrote object");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, mostly for tests and dry runs.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), Bytes>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|b| b.clone())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|e| e.key().0 == bucket)
            .map(|e| e.key().1.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> KeywordResult<Bytes> {
        self.get(bucket, key)
            .ok_or_else(|| retrieval_error(bucket, key, "no such object"))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> KeywordResult<()> {
        self.insert(bucket, key, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_round_trip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put_object("hits", "result/2026-01-01_out.tab", Bytes::from_static(b"x\ty\n"))
            .await
            .unwrap();

        assert!(dir.path().join("hits/result/2026-01-01_out.tab").is_file());
        let body = store.get_object("hits", "result/2026-01-01_out.tab").await.unwrap();
        assert_eq!(&body[..], b"x\ty\n");
    }

    #[tokio::test]
    async fn test_local_missing_object_is_retrieval_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = store.get_object("hits", "data.tsv").await.unwrap_err();
        assert!(matches!(err, KeywordError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn test_local_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = store.get_object("hits", "../secret").await.unwrap_err();
        assert!(matches!(err, KeywordError::Retrieval { .. }));
        let err = store.get_object("hits", "/etc/passwd").await.unwrap_err();
        assert!(matches!(err, KeywordError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryObjectStore::new();
        store.insert("b", "k1", "one");
        store
            .put_object("b", "k2", Bytes::from_static(b"two"))
            .await
            .unwrap();

        assert_eq!(store.keys("b"), vec!["k1".to_string(), "k2".to_string()]);
        assert_eq!(&store.get_object("b", "k1").await.unwrap()[..], b"one");
        assert!(store.get_object("other", "k1").await.is_err());
    }
}
