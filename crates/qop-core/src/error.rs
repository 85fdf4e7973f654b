//! Error types for qop.
//!
//! This module provides a unified error type for all qop operations,
//! with specific error variants for different failure modes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for qop operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for qop.
#[derive(Error, Debug)]
pub enum Error {
    /// Directory does not exist
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Payload exceeds the capacity of a single QR symbol
    #[error("payload of {size} bytes does not fit in one QR code: {reason}")]
    PayloadTooLarge {
        /// Size of the rejected payload in bytes
        size: usize,
        /// Reason reported by the QR encoder
        reason: String,
    },

    /// QR image encoding failed
    #[error("failed to encode QR image: {0}")]
    QrRender(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns whether this error aborts a session.
    ///
    /// Recoverable errors (an unreadable source file, an oversized payload)
    /// are logged and skipped; everything else terminates the command.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}
