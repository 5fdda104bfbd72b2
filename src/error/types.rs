//! Error types
//!
//! Defines domain-specific error types for the storage engine and the server
//! that fronts it.

use std::fmt;
use std::io;

/// Storage module errors
///
/// Every engine operation fails with exactly one of these. `InvalidPath` is
/// always produced before any filesystem state is inspected.
#[derive(Debug)]
pub enum StorageError {
    InvalidPath(String),
    AlreadyExists(String),
    NotFound(String),
    NotAFile(String),
    NotADirectory(String),
    NoFileProvided,
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::AlreadyExists(p) => {
                write!(f, "A file/folder with this name already exists: {}", p)
            }
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::NotAFile(p) => write!(f, "Not a file: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::NoFileProvided => write!(f, "No file uploaded"),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// General server error used during bootstrap and by the accept loop
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Config(config::ConfigError),
    IoError(io::Error),
    NetworkError(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ServerError::NetworkError(e) => write!(f, "Network error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
