//! Error types for the broker and the RPC layer.

use thiserror::Error;

use quill_proto::rpc;

/// Errors from the transport broker.
#[derive(Debug, Error)]
pub enum MuxError {
    /// The physical transport is gone; fatal to every channel on it.
    #[error("transport closed")]
    TransportClosed,

    /// A single channel was closed; the transport may still be alive.
    #[error("channel {0} closed")]
    ChannelClosed(u32),

    /// The channel id is already listening, dialing, or established.
    #[error("channel {0} already in use")]
    ChannelInUse(u32),

    /// The peer never listened on the dialed id.
    #[error("dial timed out on channel {0}: no listener on peer")]
    DialTimeout(u32),

    /// IO failure on the physical stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the RPC layer.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The underlying channel or transport died mid-call.
    #[error("transport closed")]
    TransportClosed,

    /// Broker-level failure.
    #[error(transparent)]
    Mux(#[from] MuxError),

    /// Encode/decode failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// No handler registered for the method.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Parameters did not match the method signature.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The peer does not implement this optional capability.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A command ran and failed; the message may carry the notification marker.
    #[error("{0}")]
    Command(String),

    /// Handler-side failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Error response received from the peer.
    #[error("remote error {code}: {message}")]
    Remote {
        /// Peer-assigned error code.
        code: i32,
        /// Peer-assigned message.
        message: String,
    },
}

impl RpcError {
    /// Returns the wire error code for this error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Json(_) => rpc::PARSE_ERROR,
            Self::MethodNotFound(_) => rpc::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => rpc::INVALID_PARAMS,
            Self::NotFound(_) => rpc::NOT_FOUND,
            Self::Unsupported(_) => rpc::UNSUPPORTED,
            Self::Command(_) => rpc::COMMAND_FAILED,
            Self::TransportClosed | Self::Mux(_) => rpc::UNAVAILABLE,
            Self::Internal(_) => rpc::INTERNAL_ERROR,
            Self::Remote { code, .. } => *code,
        }
    }
}
