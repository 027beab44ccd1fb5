//! Object Storage Client
//!
//! Stores car photos as objects in a bucket and hands out public URLs.
//!
//! - **ObjectStore**: upload / public URL / remove by key
//! - **LocalBucket**: filesystem implementation served by the API under
//!   the hosted-storage public URL layout
//!
//! Stored records only keep the public URL. The object key is recovered
//! from it with [`storage_key_from_url`] when a photo is removed.

pub mod bucket;
pub mod error;

pub use bucket::{validate_key, LocalBucket, PUBLIC_OBJECT_PATH};
pub use error::{StorageError, StorageResult};

use async_trait::async_trait;

/// A bucket of publicly readable objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, as embedded in public URLs
    fn bucket(&self) -> &str;

    /// Store `data` under `key`. Existing keys are never overwritten.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<()>;

    /// Public URL for `key`
    fn public_url(&self, key: &str) -> String;

    /// Delete objects by key
    async fn remove(&self, keys: &[String]) -> StorageResult<()>;
}

/// Recover the object key from a public URL by splitting on `/<bucket>/`.
///
/// Returns `None` unless the URL contains the bucket segment exactly once.
pub fn storage_key_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    let parts: Vec<&str> = url.split(marker.as_str()).collect();

    if parts.len() != 2 {
        return None;
    }

    let raw = parts[1].split(['?', '#']).next().unwrap_or_default();
    if raw.is_empty() {
        return None;
    }

    urlencoding::decode(raw).ok().map(|k| k.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_public_url() {
        let url = "http://localhost:8082/storage/v1/object/public/car-photos/k3j4-1700000000.jpg";
        assert_eq!(
            storage_key_from_url(url, "car-photos").as_deref(),
            Some("k3j4-1700000000.jpg")
        );
    }

    #[test]
    fn test_key_from_url_strips_query() {
        let url = "https://cdn.example.com/car-photos/a%20b.png?width=200";
        assert_eq!(
            storage_key_from_url(url, "car-photos").as_deref(),
            Some("a b.png")
        );
    }

    #[test]
    fn test_key_from_foreign_url() {
        assert!(storage_key_from_url("https://example.com/img.jpg", "car-photos").is_none());
        assert!(storage_key_from_url("https://x/car-photos/", "car-photos").is_none());
        assert!(
            storage_key_from_url("https://x/car-photos/a/car-photos/b.jpg", "car-photos")
                .is_none()
        );
    }
}
