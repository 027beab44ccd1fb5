//! Record store error types

use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite rejected the statement or the connection failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed (creating the data directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A photo list column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No row with this id
    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: i64 },

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::NotFound {
            table: "carros",
            id: 42,
        };
        assert_eq!(err.to_string(), "carros record 42 not found");
    }
}
