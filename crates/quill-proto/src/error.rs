//! Protocol error types.

use thiserror::Error;

/// Errors produced while parsing or validating protocol data.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Handshake line did not have the expected shape.
    #[error("malformed handshake line: {0:?}")]
    MalformedHandshake(String),

    /// Plugin speaks a different protocol version.
    #[error("protocol version mismatch: expected {expected}, plugin speaks {actual}")]
    VersionMismatch {
        /// Version this host speaks.
        expected: u32,
        /// Version the plugin announced.
        actual: u32,
    },

    /// Magic cookie did not match; the process is not a Quill plugin.
    #[error("magic cookie mismatch: executable is not a compatible plugin")]
    CookieMismatch,

    /// JSON encode/decode failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
