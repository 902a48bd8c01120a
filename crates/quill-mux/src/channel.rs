//! Logical sub-connections.

use serde_json::Value;
use tokio::sync::mpsc;

use quill_proto::Frame;

use crate::error::MuxError;

/// The sending half of a channel. Cheap to clone; every clone funnels into
/// the broker's single writer task, which serializes framing.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    id: u32,
    frames: mpsc::Sender<Frame>,
}

impl ChannelSender {
    pub(crate) const fn new(id: u32, frames: mpsc::Sender<Frame>) -> Self {
        Self { id, frames }
    }

    /// Returns the channel id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Sends one payload to the peer end of this channel.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::TransportClosed`] if the broker has shut down.
    pub async fn send(&self, payload: Value) -> Result<(), MuxError> {
        self.frames
            .send(Frame::Data {
                id: self.id,
                payload,
            })
            .await
            .map_err(|_| MuxError::TransportClosed)
    }

    /// Announces a graceful close of this channel to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::TransportClosed`] if the broker has shut down.
    pub async fn close(&self) -> Result<(), MuxError> {
        self.frames
            .send(Frame::Close { id: self.id })
            .await
            .map_err(|_| MuxError::TransportClosed)
    }
}

/// The receiving half of a channel.
#[derive(Debug)]
pub struct ChannelReceiver {
    id: u32,
    data: mpsc::Receiver<Value>,
}

impl ChannelReceiver {
    pub(crate) const fn new(id: u32, data: mpsc::Receiver<Value>) -> Self {
        Self { id, data }
    }

    /// Returns the channel id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Receives the next payload from the peer.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::ChannelClosed`] once the channel or the transport
    /// is gone; no payload is ever silently dropped before that.
    pub async fn recv(&mut self) -> Result<Value, MuxError> {
        self.data
            .recv()
            .await
            .ok_or(MuxError::ChannelClosed(self.id))
    }
}

/// A logical sub-connection obtained from the broker.
#[derive(Debug)]
pub struct Channel {
    sender: ChannelSender,
    receiver: ChannelReceiver,
}

impl Channel {
    pub(crate) const fn new(sender: ChannelSender, receiver: ChannelReceiver) -> Self {
        Self { sender, receiver }
    }

    /// Returns the channel id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.sender.id()
    }

    /// Splits the channel into independently owned halves.
    #[must_use]
    pub fn split(self) -> (ChannelSender, ChannelReceiver) {
        (self.sender, self.receiver)
    }

    /// Sends one payload to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::TransportClosed`] if the broker has shut down.
    pub async fn send(&self, payload: Value) -> Result<(), MuxError> {
        self.sender.send(payload).await
    }

    /// Receives the next payload from the peer.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::ChannelClosed`] once the channel is gone.
    pub async fn recv(&mut self) -> Result<Value, MuxError> {
        self.receiver.recv().await
    }
}
