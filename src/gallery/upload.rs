//! Batch upload and single-photo removal

use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PhotosConfig;
use crate::notices;
use crate::storage::{storage_key_from_url, ObjectStore, StorageError};

/// Size, count and type limits for one gallery
#[derive(Debug, Clone)]
pub struct PhotoLimits {
    pub max_photos: usize,
    pub max_file_size: usize,
    pub allowed_types: Vec<String>,
}

impl Default for PhotoLimits {
    fn default() -> Self {
        Self::from(&PhotosConfig::default())
    }
}

impl From<&PhotosConfig> for PhotoLimits {
    fn from(config: &PhotosConfig) -> Self {
        Self {
            max_photos: config.max_photos,
            max_file_size: config.max_file_size,
            allowed_types: config
                .allowed_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }
}

/// A file received from the operator
#[derive(Debug, Clone)]
pub struct IncomingPhoto {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    /// Bytes received; larger than `data` when the body was dropped
    pub size: usize,
}

impl IncomingPhoto {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let data = data.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: data.len(),
            data,
        }
    }

    /// A file whose body was discarded while reading because it passed the
    /// size limit. Only its name, type and received size are kept.
    pub fn oversized(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        size: usize,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: Vec::new(),
            size,
        }
    }

    /// MIME type without parameters, lowercased
    fn mime(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    UnsupportedType { content_type: String },
    TooLarge { size: usize, max: usize },
}

/// A file skipped during a batch, with the notice shown for it
#[derive(Debug, Clone, Serialize)]
pub struct RejectedPhoto {
    pub file_name: String,
    pub reason: RejectReason,
    pub message: String,
}

/// Result of a batch upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// Existing URLs followed by the newly uploaded ones
    pub photos: Vec<String>,
    /// URLs added by this batch, in upload order
    pub uploaded: Vec<String>,
    pub rejected: Vec<RejectedPhoto>,
}

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Batch would exceed the limit of {max} photos ({existing} existing + {incoming} new)")]
    TooManyPhotos {
        max: usize,
        existing: usize,
        incoming: usize,
    },

    #[error("No photo at index {index} (gallery has {len})")]
    NoSuchPhoto { index: usize, len: usize },

    #[error("Photo upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Photo removal failed: {0}")]
    Remove(#[source] StorageError),
}

impl GalleryError {
    /// Notice shown to the operator
    pub fn notice(&self) -> String {
        match self {
            GalleryError::TooManyPhotos { max, .. } => notices::too_many_photos(*max),
            GalleryError::NoSuchPhoto { .. } | GalleryError::Remove(_) => {
                notices::PHOTO_REMOVE_FAILED.to_string()
            }
            GalleryError::Upload(_) => notices::UPLOAD_FAILED.to_string(),
        }
    }
}

/// Upload/remove workflow for an ordered list of photo URLs
#[derive(Clone)]
pub struct PhotoGallery {
    store: Arc<dyn ObjectStore>,
    limits: PhotoLimits,
}

impl PhotoGallery {
    pub fn new(store: Arc<dyn ObjectStore>, limits: PhotoLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &PhotoLimits {
        &self.limits
    }

    /// Validate and upload a batch, appending the resulting URLs to `existing`.
    ///
    /// The whole batch is refused when the combined count would exceed the
    /// limit. Otherwise files with a disallowed type or size are skipped and
    /// reported individually. A storage failure aborts the batch and leaves
    /// the list unchanged.
    pub async fn upload_batch(
        &self,
        existing: &[String],
        files: Vec<IncomingPhoto>,
    ) -> Result<UploadOutcome, GalleryError> {
        if existing.len() + files.len() > self.limits.max_photos {
            tracing::info!(
                existing = existing.len(),
                incoming = files.len(),
                max = self.limits.max_photos,
                "Photo batch refused: over limit"
            );
            return Err(GalleryError::TooManyPhotos {
                max: self.limits.max_photos,
                existing: existing.len(),
                incoming: files.len(),
            });
        }

        let mut uploaded_keys: Vec<String> = Vec::new();
        let mut uploaded = Vec::new();
        let mut rejected = Vec::new();

        for file in files {
            if let Err(reason) = self.check(&file) {
                let message = match &reason {
                    RejectReason::UnsupportedType { .. } => notices::not_an_image(&file.file_name),
                    RejectReason::TooLarge { max, .. } => {
                        notices::file_too_large(&file.file_name, *max)
                    }
                };
                tracing::info!(file = %file.file_name, reason = ?reason, "Photo skipped");
                rejected.push(RejectedPhoto {
                    file_name: file.file_name,
                    reason,
                    message,
                });
                continue;
            }

            let key = object_key(&file);
            if let Err(e) = self.store.upload(&key, &file.data, &file.mime()).await {
                tracing::error!(file = %file.file_name, key = %key, error = %e, "Photo upload failed");
                self.discard(&uploaded_keys).await;
                return Err(GalleryError::Upload(e));
            }

            uploaded.push(self.store.public_url(&key));
            uploaded_keys.push(key);
        }

        let mut photos = existing.to_vec();
        photos.extend(uploaded.iter().cloned());

        tracing::info!(
            uploaded = uploaded.len(),
            rejected = rejected.len(),
            total = photos.len(),
            "Photo batch processed"
        );

        Ok(UploadOutcome {
            photos,
            uploaded,
            rejected,
        })
    }

    /// Delete the photo at `index` from storage, then drop it from the list.
    ///
    /// If the storage delete fails the list is returned untouched via the
    /// error. URLs that do not point into this bucket are only dropped from
    /// the list.
    pub async fn remove(&self, existing: &[String], index: usize) -> Result<Vec<String>, GalleryError> {
        let url = existing.get(index).ok_or(GalleryError::NoSuchPhoto {
            index,
            len: existing.len(),
        })?;

        match storage_key_from_url(url, self.store.bucket()) {
            Some(key) => {
                self.store
                    .remove(std::slice::from_ref(&key))
                    .await
                    .map_err(|e| {
                        tracing::error!(key = %key, error = %e, "Photo removal failed");
                        GalleryError::Remove(e)
                    })?;
                tracing::info!(key = %key, "Photo removed");
            }
            None => {
                tracing::debug!(url = %url, "Photo URL outside bucket, dropping reference only");
            }
        }

        let mut photos = existing.to_vec();
        photos.remove(index);
        Ok(photos)
    }

    fn check(&self, file: &IncomingPhoto) -> Result<(), RejectReason> {
        let mime = file.mime();
        if !self.limits.allowed_types.iter().any(|t| *t == mime) {
            return Err(RejectReason::UnsupportedType {
                content_type: file.content_type.clone(),
            });
        }

        if file.size > self.limits.max_file_size {
            return Err(RejectReason::TooLarge {
                size: file.size,
                max: self.limits.max_file_size,
            });
        }

        Ok(())
    }

    /// Best-effort cleanup of objects stored before a batch failed
    async fn discard(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.store.remove(keys).await {
            tracing::warn!(keys = ?keys, error = %e, "Could not clean up partial photo batch");
        }
    }
}

/// `<random>-<unix_millis>.<ext>`
fn object_key(file: &IncomingPhoto) -> String {
    format!(
        "{}-{}.{}",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis(),
        extension_for(file)
    )
}

fn extension_for(file: &IncomingPhoto) -> String {
    let from_name = Path::new(&file.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match file.mime().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "bin",
        }
        .to_string()
    })
}
