//! Multiplexer frames.
//!
//! The broker shares one physical stream between logical channels by framing
//! every message with its channel id. One JSON object per line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The primary channel, pre-established on both sides at broker construction.
///
/// Host-to-plugin calls flow over this channel; callback channels for the
/// reverse direction are allocated dynamically.
pub const PRIMARY_CHANNEL: u32 = 0;

/// A single frame on the physical stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    /// Request to open channel `id`, sent by the dialing side.
    Open {
        /// Channel id being dialed.
        id: u32,
    },
    /// Acknowledgment that channel `id` is established, sent by the listening side.
    OpenAck {
        /// Channel id now established.
        id: u32,
    },
    /// Payload for an established channel.
    Data {
        /// Channel id the payload belongs to.
        id: u32,
        /// Channel payload, an [`crate::RpcMessage`] in practice.
        payload: Value,
    },
    /// Graceful close of a single channel.
    Close {
        /// Channel id being closed.
        id: u32,
    },
}

impl Frame {
    /// Returns the channel id this frame addresses.
    #[must_use]
    pub const fn channel(&self) -> u32 {
        match self {
            Self::Open { id }
            | Self::OpenAck { id }
            | Self::Data { id, .. }
            | Self::Close { id } => *id,
        }
    }
}
