//! Error types for Inventory Core

use thiserror::Error;

/// Coarse error classification exposed to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (e.g. mismatched batch lists)
    InvalidArgument,
    /// Missing or malformed archive structure
    InvalidArchive,
    /// Underlying read/write failure
    StorageFailure,
    /// Operation targets a missing row
    NotFound,
}

/// Main error type for inventory operations
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Database file not found at the specified path
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Archive is missing or does not have the expected structure
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Archive read/write failed
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    /// Location not found
    #[error("Location not found: {0}")]
    LocationNotFound(i64),

    /// Name already taken within its uniqueness scope
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Background session is no longer accepting or answering jobs
    #[error("Session closed")]
    SessionClosed,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InventoryError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::InvalidArgument(_) | InventoryError::DuplicateName(_) => {
                ErrorKind::InvalidArgument
            }
            InventoryError::InvalidArchive(_) => ErrorKind::InvalidArchive,
            InventoryError::DatabaseNotFound(_)
            | InventoryError::ItemNotFound(_)
            | InventoryError::CategoryNotFound(_)
            | InventoryError::LocationNotFound(_) => ErrorKind::NotFound,
            InventoryError::DatabaseError(_)
            | InventoryError::ArchiveError(_)
            | InventoryError::SerializationError(_)
            | InventoryError::SessionClosed
            | InventoryError::IoError(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<rusqlite::Error> for InventoryError {
    fn from(err: rusqlite::Error) -> Self {
        InventoryError::DatabaseError(err.to_string())
    }
}

impl From<zip::result::ZipError> for InventoryError {
    fn from(err: zip::result::ZipError) -> Self {
        InventoryError::ArchiveError(err.to_string())
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::SerializationError(err.to_string())
    }
}

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InventoryError::DatabaseNotFound("/path/to/db".to_string());
        assert!(err.to_string().contains("/path/to/db"));

        let err = InventoryError::ItemNotFound(42);
        assert_eq!(err.to_string(), "Item not found: 42");

        let err = InventoryError::SessionClosed;
        assert_eq!(err.to_string(), "Session closed");

        let err = InventoryError::InvalidArchive("missing categories".to_string());
        assert!(err.to_string().contains("missing categories"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(InventoryError::InvalidArgument("x".into()).kind(), ErrorKind::InvalidArgument);
        assert_eq!(InventoryError::DuplicateName("x".into()).kind(), ErrorKind::InvalidArgument);
        assert_eq!(InventoryError::InvalidArchive("x".into()).kind(), ErrorKind::InvalidArchive);
        assert_eq!(InventoryError::ItemNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(InventoryError::CategoryNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(InventoryError::SessionClosed.kind(), ErrorKind::StorageFailure);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(InventoryError::from(io).kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn test_error_from_rusqlite() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: InventoryError = sqlite_err.into();
        match err {
            InventoryError::DatabaseError(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected DatabaseError"),
        }
    }

    #[test]
    fn test_error_from_zip() {
        let zip_err = zip::result::ZipError::FileNotFound;
        let err: InventoryError = zip_err.into();
        match err {
            InventoryError::ArchiveError(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected ArchiveError"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: InventoryError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }
}
