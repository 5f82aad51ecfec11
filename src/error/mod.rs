//! # Error Module
//!
//! Error types for the culling library.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Downgrade at the boundary** - cache, selection store and registry
//!   operations log these and return a safe default, so nothing here is
//!   fatal to the process

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum FotoFilterError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Addressing error: {0}")]
    Address(#[from] AddressError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Selection store error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Library is {state}, cannot {action}")]
    InvalidState { state: String, action: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while scanning a source folder
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors computing a content address
#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Source file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the image decode collaborator
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Image file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported image format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the derived-image cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Source file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Cannot render {path}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Failed to encode artifact {path}: {reason}")]
    EncodeFailed { path: PathBuf, reason: String },

    #[error("Cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<AddressError> for CacheError {
    fn from(error: AddressError) -> Self {
        match error {
            AddressError::FileNotFound { path } => CacheError::FileNotFound { path },
            AddressError::Metadata { path, source } => CacheError::Io { path, source },
        }
    }
}

impl From<DecodeError> for CacheError {
    fn from(error: DecodeError) -> Self {
        match error {
            DecodeError::FileNotFound { path } => CacheError::FileNotFound { path },
            DecodeError::Io { path, source } => CacheError::Io { path, source },
            DecodeError::UnsupportedFormat { path } => CacheError::DecodeFailure {
                path,
                reason: "unsupported format".to_string(),
            },
            DecodeError::DecodeFailure { path, reason } => {
                CacheError::DecodeFailure { path, reason }
            }
        }
    }
}

/// Errors reading or writing selection documents
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Selection document {path} is corrupt: {reason}")]
    DocumentCorrupt { path: PathBuf, reason: String },

    #[error("Selection document I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize selections: {0}")]
    Serialize(String),
}

/// Errors copying or deleting backing files
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Destination is not a usable directory: {path}")]
    DestinationInvalid { path: PathBuf },

    #[error("Failed to transfer {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {path} to trash: {reason}")]
    Trash { path: PathBuf, reason: String },

    #[error("{failed} of {total} files failed, first error: {first}")]
    Incomplete {
        failed: usize,
        total: usize,
        first: String,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FotoFilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_error_includes_path() {
        let error = AddressError::FileNotFound {
            path: PathBuf::from("/photos/IMG_0001.CR3"),
        };
        assert!(error.to_string().contains("/photos/IMG_0001.CR3"));
    }

    #[test]
    fn decode_failure_maps_to_cache_decode_failure() {
        let error: CacheError = DecodeError::DecodeFailure {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        }
        .into();

        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
        assert!(matches!(error, CacheError::DecodeFailure { .. }));
    }

    #[test]
    fn missing_source_stays_file_not_found() {
        let error: CacheError = AddressError::FileNotFound {
            path: PathBuf::from("/gone.nef"),
        }
        .into();
        assert!(matches!(error, CacheError::FileNotFound { .. }));
    }

    #[test]
    fn corrupt_document_names_the_file() {
        let error = SelectionError::DocumentCorrupt {
            path: PathBuf::from("/cache/_photos.selections.json"),
            reason: "expected value".to_string(),
        };
        assert!(error.to_string().contains("_photos.selections.json"));
    }
}
