//! Host-side error types.

use thiserror::Error;

/// Errors from launching and tearing down a plugin process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Spawning or talking to the child process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The child's stdout or stderr pipe could not be captured.
    #[error("plugin stdio could not be captured")]
    Stdio,

    /// The child printed nothing within the handshake deadline.
    #[error("plugin did not complete the handshake in time")]
    HandshakeTimeout,

    /// The child exited before printing a handshake line.
    #[error("plugin exited before completing the handshake")]
    PluginExited,

    /// The handshake line was malformed or carried a wrong version/cookie.
    #[error(transparent)]
    Handshake(#[from] quill_proto::ProtoError),
}
