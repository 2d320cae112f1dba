//! Error types for `.sdf` operations.
//!
//! This module provides the [`Error`] enum covering every failure the core
//! reports, along with a convenient [`Result`] type alias. Vendor status codes
//! never appear here directly; they are translated by the status mapper first.
//!
//! Errors are `Clone` so a sequence that has failed can hand the same error
//! back on every later call.

use std::ffi::NulError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::waveform::Channel;

/// Result type alias for `.sdf` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading `.sdf` files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The path does not resolve to a file.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// The file exists but cannot be read by this process.
    #[error("Permission denied: {}", path.display())]
    PermissionDenied {
        /// Path that could not be read.
        path: PathBuf,
    },

    /// The vendor library rejected the file contents as malformed.
    #[error("Corrupt SDF file: {reason}")]
    Corrupt {
        /// Description of the problem.
        reason: String,
        /// Raw vendor status code, when the vendor reported the problem.
        code: Option<i32>,
    },

    /// The file declares a format version newer than this crate understands.
    #[error("Unsupported format version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version declared by the file.
        found: u16,
        /// Highest version this crate reads.
        supported: u16,
    },

    /// Any other failure reported by the vendor library.
    #[error("Native library failure (code {code}): {message}")]
    NativeFailure {
        /// Raw vendor status code, kept for support requests.
        code: i32,
        /// Message reported by the vendor library, possibly empty.
        message: String,
    },

    /// The path cannot be handed to the vendor library.
    #[error("Invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Error converting a Rust string to C string (embedded null byte).
    #[error("Invalid C string: {0}")]
    CString(#[from] NulError),

    /// A sample block carried a channel number outside 0..=3.
    #[error("Invalid channel: {0}")]
    InvalidChannel(u32),

    /// Calibration tables exist only for the high and low channels.
    #[error("No calibration table for channel: {channel}")]
    NoCalibrationTable {
        /// The requested channel.
        channel: Channel,
    },

    /// Operation performed in the wrong state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state error.
        message: &'static str,
    },

    /// Any other I/O error from checking the path before opening.
    #[error("I/O error on {}: {message}", path.display())]
    Io {
        /// The path being checked.
        path: PathBuf,
        /// The I/O error kind.
        kind: io::ErrorKind,
        /// The I/O error message.
        message: String,
    },
}

impl Error {
    /// Create a Corrupt error with the given reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
            code: None,
        }
    }

    /// Create a Corrupt error reported by the vendor with status `code`.
    pub fn corrupt_with_code(code: i32, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
            code: Some(code),
        }
    }

    /// Create a NativeFailure error.
    pub fn native(code: i32, message: impl Into<String>) -> Self {
        Self::NativeFailure {
            code,
            message: message.into(),
        }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Create an InvalidState error.
    pub const fn invalid_state(message: &'static str) -> Self {
        Self::InvalidState { message }
    }

    /// Create an error from an I/O failure on `path`.
    ///
    /// Not-found and permission errors get their own variants.
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            kind => Self::Io {
                path: path.into(),
                kind,
                message: err.to_string(),
            },
        }
    }

    /// The raw vendor status code, when the error came from the vendor library.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::NativeFailure { code, .. } => Some(*code),
            Self::Corrupt { code, .. } => *code,
            _ => None,
        }
    }

    /// A short, stable name for the kind of error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not-found",
            Self::PermissionDenied { .. } => "permission-denied",
            Self::Corrupt { .. } => "corrupt",
            Self::UnsupportedVersion { .. } => "unsupported-version",
            Self::NativeFailure { .. } => "native-failure",
            Self::InvalidPath { .. } | Self::CString(_) => "invalid-path",
            Self::InvalidChannel(_) => "invalid-channel",
            Self::NoCalibrationTable { .. } => "no-calibration-table",
            Self::InvalidState { .. } => "invalid-state",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::native(6, "disk on fire");
        assert!(err.to_string().contains("code 6"));
        assert!(err.to_string().contains("disk on fire"));

        let err = Error::UnsupportedVersion {
            found: 9,
            supported: 1,
        };
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_error_from_io() {
        let path = Path::new("/data/scan.sdf");

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        assert!(matches!(Error::from_io(path, &io_err), Error::NotFound { .. }));

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            Error::from_io(path, &io_err),
            Error::PermissionDenied { .. }
        ));

        let io_err = io::Error::new(io::ErrorKind::Interrupted, "signal");
        match Error::from_io(path, &io_err) {
            Error::Io { kind, .. } => assert_eq!(kind, io::ErrorKind::Interrupted),
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn test_code_only_for_vendor_errors() {
        assert_eq!(Error::native(4, "").code(), Some(4));
        assert_eq!(Error::corrupt_with_code(2, "bad magic").code(), Some(2));
        assert_eq!(Error::corrupt("bad header").code(), None);
        assert_eq!(Error::corrupt("bad header").kind(), "corrupt");
        assert_eq!(Error::invalid_state("closed").code(), None);
    }
}
