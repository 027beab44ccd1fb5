//! Filesystem bucket
//!
//! Objects live at `<root>/<key>` and are published under
//! `<public_base>/storage/v1/object/public/<bucket>/<key>`, the same URL
//! layout the hosted storage service uses, so stored URLs stay valid if the
//! bucket moves.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::error::{StorageError, StorageResult};
use super::ObjectStore;

/// Path prefix under which public objects are served
pub const PUBLIC_OBJECT_PATH: &str = "/storage/v1/object/public";

/// Write a freshly created object, deleting `path` if the write fails so no
/// partial object is left behind
async fn write_new_object<W>(mut out: W, path: &Path, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match out.write_all(data).await {
        Ok(()) => out.flush().await,
        Err(e) => Err(e),
    };
    drop(out);

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = ?path, error = %cleanup, "Failed to discard partial object");
        }
        return Err(e);
    }
    Ok(())
}

/// Object store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalBucket {
    bucket: String,
    root: PathBuf,
    public_base: String,
}

impl LocalBucket {
    /// Open (creating if needed) `<data_dir>/buckets/<bucket>`
    pub fn open(
        data_dir: &Path,
        bucket: impl Into<String>,
        public_base: impl Into<String>,
    ) -> StorageResult<Self> {
        let bucket = bucket.into();
        validate_key(&bucket)?;

        let root = data_dir.join("buckets").join(&bucket);
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            bucket,
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Directory holding the objects (served over HTTP)
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<()> {
        let path = self.object_path(key)?;

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        write_new_object(file, &path, data).await?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size = data.len(),
            content_type = %content_type,
            "Stored object"
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.public_base,
            PUBLIC_OBJECT_PATH,
            self.bucket,
            urlencoding::encode(key)
        )
    }

    async fn remove(&self, keys: &[String]) -> StorageResult<()> {
        for key in keys {
            let path = self.object_path(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(bucket = %self.bucket, key = %key, "Removed object");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(bucket = %self.bucket, key = %key, "Object already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Reject keys that could escape the bucket directory
pub fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);

    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bucket(dir: &Path) -> LocalBucket {
        LocalBucket::open(dir, "car-photos", "http://localhost:8082/").unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let dir = tempdir().unwrap();
        let bucket = bucket(dir.path());

        bucket.upload("abc-1.jpg", b"jpeg", "image/jpeg").await.unwrap();

        let stored = std::fs::read(bucket.root().join("abc-1.jpg")).unwrap();
        assert_eq!(stored, b"jpeg");
        assert_eq!(
            bucket.public_url("abc-1.jpg"),
            "http://localhost:8082/storage/v1/object/public/car-photos/abc-1.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_never_overwrites() {
        let dir = tempdir().unwrap();
        let bucket = bucket(dir.path());

        bucket.upload("same.png", b"one", "image/png").await.unwrap();
        let second = bucket.upload("same.png", b"two", "image/png").await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        assert_eq!(std::fs::read(bucket.root().join("same.png")).unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let bucket = bucket(dir.path());

        bucket.upload("gone.webp", b"x", "image/webp").await.unwrap();
        bucket.remove(&["gone.webp".to_string()]).await.unwrap();
        assert!(!bucket.root().join("gone.webp").exists());

        // missing objects are not an error
        bucket.remove(&["gone.webp".to_string()]).await.unwrap();
    }

    /// Accepts nothing
    struct BrokenDisk;

    impl AsyncWrite for BrokenDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("half.jpg");
        std::fs::write(&path, b"").unwrap();

        let result = write_new_object(BrokenDisk, &path, b"jpeg bytes").await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = tempdir().unwrap();
        let bucket = bucket(dir.path());

        for key in ["", "..", "../x.jpg", "a/b.jpg", "a\\b.jpg"] {
            assert!(
                matches!(
                    bucket.upload(key, b"x", "image/jpeg").await,
                    Err(StorageError::InvalidKey(_))
                ),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
