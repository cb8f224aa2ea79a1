//! Error taxonomy for the codec.
//!
//! Two strata cross the callback boundary:
//!
//! - [`CodecError::Connection`]: the connection is unrecoverable. Reported
//!   once on stream 0; the codec stops consuming input afterwards.
//! - [`CodecError::Stream`]: one request/response is malformed. Reported on
//!   its stream with `new_txn = true`; the connection keeps going.
//!
//! A third stratum never surfaces: locally recoverable conditions (unknown
//! frame types, unknown settings, stale GOAWAY, zero-delta stream
//! WINDOW_UPDATE) are logged and dropped.

use thiserror::Error;

/// Errors delivered through [`CodecCallbacks::on_error`](crate::CodecCallbacks::on_error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Connection-fatal protocol violation, carrying the HTTP/2 error code
    /// (PROTOCOL_ERROR, FRAME_SIZE_ERROR, COMPRESSION_ERROR, ...).
    #[error("connection error: code={code:#x}")]
    Connection { code: u32 },

    /// Stream-local failure, carrying the HTTP status a synthesized error
    /// response should use (400 for malformed header blocks).
    #[error("stream error: {message} (http status {status})")]
    Stream { status: u16, message: String },
}

impl CodecError {
    pub(crate) fn connection(code: u32) -> Self {
        Self::Connection { code }
    }

    pub(crate) fn stream(status: u16, message: impl Into<String>) -> Self {
        Self::Stream {
            status,
            message: message.into(),
        }
    }

    /// The HTTP/2 error code for connection errors, `None` for stream errors.
    pub fn connection_code(&self) -> Option<u32> {
        match self {
            Self::Connection { code } => Some(*code),
            Self::Stream { .. } => None,
        }
    }

    /// The HTTP status for stream errors, `None` for connection errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Connection { .. } => None,
            Self::Stream { status, .. } => Some(*status),
        }
    }
}
