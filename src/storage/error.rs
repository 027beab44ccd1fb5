//! Object storage error types

use thiserror::Error;

/// Errors that can occur in the object store
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains path separators or is empty
    #[error("Invalid object key: {0:?}")]
    InvalidKey(String),

    /// Uploads never overwrite an existing object
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// Remote backend rejected the request
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type alias for object storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::AlreadyExists("a.jpg".to_string());
        assert_eq!(err.to_string(), "Object already exists: a.jpg");

        let err = StorageError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid object key: \"../etc\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StorageError = io_err.into();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
