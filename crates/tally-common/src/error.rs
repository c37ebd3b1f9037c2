//! Error types for Tally
//!
//! This module defines the common error types used throughout the system.

use crate::types::ItemIdError;
use thiserror::Error;

/// Common result type for Tally operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Tally
#[derive(Debug, Error)]
pub enum Error {
    // Request errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid item id: {0}")]
    InvalidItemId(#[from] ItemIdError),

    // Admin errors
    #[error("unauthorized: admin token missing or incorrect")]
    Unauthorized,

    #[error("admin secret is not configured")]
    AdminSecretMissing,

    // Storage errors
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a storage unavailable error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a retryable error
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Get HTTP status code for API responses
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidArgument(_) | Self::InvalidItemId(_) => 400,

            // 401 Unauthorized
            Self::Unauthorized => 401,

            // 500 Internal Server Error
            Self::Internal(_) => 500,

            // 503 Service Unavailable
            Self::StorageUnavailable(_) | Self::AdminSecretMissing => 503,
        }
    }
}
