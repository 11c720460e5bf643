//! Error taxonomy for the wipe executor.
//!
//! `WipeErrorKind` is the closed set of error kinds the executor can
//! report; `WipeError` pairs a kind with a human-readable message and
//! participates in the standard `std::error::Error` hierarchy the rest
//! of the crate builds on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of executor-reportable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeErrorKind {
    DeviceNotFound,
    DeviceBusy,
    Unsupported,
    PermissionDenied,
    Timeout,
    IoError,
    VerificationFailed,
    Cancelled,
}

impl WipeErrorKind {
    /// Whether the executor may substitute a fallback strategy and retry.
    ///
    /// `unsupported` falls back unconditionally; `timeout` falls back once.
    /// Everything else is terminal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WipeErrorKind::Unsupported | WipeErrorKind::Timeout)
    }

    /// Deterministic diagnosis string for this error kind.
    pub fn diagnose(&self) -> &'static str {
        match self {
            WipeErrorKind::DeviceNotFound => {
                "the addressed path does not resolve to a block device"
            }
            WipeErrorKind::DeviceBusy => {
                "a mounted partition could not be released; unmount manually and retry"
            }
            WipeErrorKind::Unsupported => {
                "the device declined the requested sanitize command; falling back to a full overwrite"
            }
            WipeErrorKind::PermissionDenied => {
                "the caller lacks privileges for raw device access; retry with elevated privileges"
            }
            WipeErrorKind::Timeout => "the sanitize sub-command exceeded its expected duration",
            WipeErrorKind::IoError => "a read or write to the device failed at the I/O layer",
            WipeErrorKind::VerificationFailed => {
                "post-wipe sector sampling found residual, non-random data"
            }
            WipeErrorKind::Cancelled => "the operation was cancelled by the caller",
        }
    }
}

impl std::fmt::Display for WipeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WipeErrorKind::DeviceNotFound => "device_not_found",
            WipeErrorKind::DeviceBusy => "device_busy",
            WipeErrorKind::Unsupported => "unsupported",
            WipeErrorKind::PermissionDenied => "permission_denied",
            WipeErrorKind::Timeout => "timeout",
            WipeErrorKind::IoError => "io_error",
            WipeErrorKind::VerificationFailed => "verification_failed",
            WipeErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct WipeError {
    pub kind: WipeErrorKind,
    pub message: String,
}

impl WipeError {
    pub fn new(kind: WipeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn device_not_found(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::DeviceNotFound, message)
    }

    pub fn device_busy(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::DeviceBusy, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::Unsupported, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::PermissionDenied, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::Timeout, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::IoError, message)
    }

    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::new(WipeErrorKind::VerificationFailed, message)
    }

    pub fn cancelled() -> Self {
        Self::new(WipeErrorKind::Cancelled, "operation cancelled")
    }
}

// std::io::Error isn't Clone, so WipeError stores only the rendered message.
impl From<std::io::Error> for WipeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => WipeError::device_not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => WipeError::permission_denied(err.to_string()),
            std::io::ErrorKind::TimedOut => WipeError::timeout(err.to_string()),
            _ => WipeError::io_error(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for WipeError {
    fn from(err: anyhow::Error) -> Self {
        WipeError::io_error(err.to_string())
    }
}

pub type WipeResult<T> = Result<T, WipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_and_timeout_are_recoverable() {
        assert!(WipeErrorKind::Unsupported.is_recoverable());
        assert!(WipeErrorKind::Timeout.is_recoverable());
        assert!(!WipeErrorKind::IoError.is_recoverable());
        assert!(!WipeErrorKind::VerificationFailed.is_recoverable());
        assert!(!WipeErrorKind::Cancelled.is_recoverable());
    }

    #[test]
    fn io_error_kind_mapping() {
        let not_found = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(
            WipeError::from(not_found).kind,
            WipeErrorKind::DeviceNotFound
        );

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(
            WipeError::from(denied).kind,
            WipeErrorKind::PermissionDenied
        );
    }
}
