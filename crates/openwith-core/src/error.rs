// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for openwith.

use thiserror::Error;

/// Every way an `open` call can fail.
///
/// Errors originate in the native layer and are relayed to the caller
/// unchanged. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no viewer available: {0}")]
    NoViewerAvailable(String),

    #[error("native file viewer is not available on this platform")]
    PlatformUnsupported,

    #[error("native viewer failed: {0}")]
    NativeFailure(String),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Discriminant of [`ViewerError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    NoViewerAvailable,
    PlatformUnsupported,
    NativeFailure,
}

impl ErrorKind {
    /// Name used by native layers when reporting a failure code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidPath => "InvalidPath",
            ErrorKind::NoViewerAvailable => "NoViewerAvailable",
            ErrorKind::PlatformUnsupported => "PlatformUnsupported",
            ErrorKind::NativeFailure => "NativeFailure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::InvalidPath(_) => ErrorKind::InvalidPath,
            ViewerError::NoViewerAvailable(_) => ErrorKind::NoViewerAvailable,
            ViewerError::PlatformUnsupported => ErrorKind::PlatformUnsupported,
            // A bad config never reaches a native layer, so from the caller's
            // point of view it is just another failure to relay.
            ViewerError::NativeFailure(_) | ViewerError::Config(_) => ErrorKind::NativeFailure,
        }
    }

    /// Build an error from a failure code reported by a native layer.
    ///
    /// Codes matching an [`ErrorKind`] name map onto that variant; anything
    /// else becomes `NativeFailure` with the message kept verbatim.
    pub fn from_native(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "InvalidPath" => ViewerError::InvalidPath(message),
            "NoViewerAvailable" => ViewerError::NoViewerAvailable(message),
            "PlatformUnsupported" => ViewerError::PlatformUnsupported,
            _ => ViewerError::NativeFailure(message),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ViewerError>;
