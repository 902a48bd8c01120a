//! SDK error types.

use thiserror::Error;

use quill_proto::notify::notification;

/// Errors returned by plugin capability methods.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Command failure text; carries the notification marker when the
    /// message is meant for the user rather than the logs.
    #[error("{0}")]
    Message(String),

    /// No such command registered by this plugin.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The plugin does not implement the optional command-execution
    /// capability.
    #[error("plugin does not support command execution")]
    UnsupportedExecution,

    /// The bridge to the peer failed.
    #[error("rpc failure: {0}")]
    Rpc(String),
}

impl PluginError {
    /// Builds a marker-prefixed user notification error.
    #[must_use]
    pub fn notify(text: impl AsRef<str>) -> Self {
        Self::Message(notification(text))
    }
}

/// Errors returned by host capability methods.
#[derive(Debug, Error)]
pub enum HostError {
    /// No buffer by that name.
    #[error("buffer not found: {0}")]
    BufferNotFound(String),

    /// No option by that name.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// Filesystem failure while opening or saving.
    #[error("io error: {0}")]
    Io(String),

    /// The bridge to the peer failed.
    #[error("rpc failure: {0}")]
    Rpc(String),

    /// Anything else the host reports.
    #[error("{0}")]
    Other(String),
}

/// Errors from the plugin process entry point.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The magic cookie environment variable is absent or wrong; the binary
    /// was most likely executed by hand.
    #[error(
        "this binary is a Quill plugin and is not meant to be run directly; \
         it must be launched by a Quill host"
    )]
    NotAPluginEnvironment,

    /// Socket setup or handshake output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge transport failed.
    #[error(transparent)]
    Mux(#[from] quill_mux::MuxError),
}
