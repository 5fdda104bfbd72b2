//! Error handlers
//!
//! Maps errors onto protocol reply codes and logs fatal server errors.

use crate::error::types::{ServerError, StorageError};
use crate::protocol::responses;
use log::error;

/// Handle a server error
pub fn handle_error(err: &ServerError) {
    error!("File manager error: {}", err);
}

/// Convert a storage error to its reply code
pub fn error_to_reply_code(err: &StorageError) -> u16 {
    match err {
        StorageError::InvalidPath(_) => responses::NAME_NOT_ALLOWED,
        StorageError::AlreadyExists(_) => responses::ALREADY_EXISTS,
        StorageError::NotFound(_) => responses::UNAVAILABLE,
        StorageError::NotAFile(_) => responses::UNAVAILABLE,
        StorageError::NotADirectory(_) => responses::UNAVAILABLE,
        StorageError::NoFileProvided => responses::SYNTAX_ERROR,
        StorageError::IoError(_) => responses::LOCAL_ERROR,
    }
}
