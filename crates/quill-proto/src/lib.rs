//! Quill plugin bridge wire protocol.
//!
//! Everything that crosses the process boundary between the Quill host and a
//! plugin is defined here: the multiplexer frames that share one physical
//! stream between logical channels, the RPC request/response envelopes carried
//! on those channels, the capability descriptors a plugin registers, the
//! buffer snapshots exchanged by value, and the out-of-band handshake line a
//! plugin prints before any RPC is attempted.
//!
//! The wire format is newline-delimited JSON: one [`Frame`] per line on the
//! physical stream, with RPC envelopes nested in data frame payloads.

pub mod buffer;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod messages;
pub mod notify;
pub mod rpc;
pub mod specs;

pub use buffer::BufferInfo;
pub use error::ProtoError;
pub use frame::Frame;
pub use handshake::{Handshake, COOKIE_ENV, COOKIE_VALUE, PROTOCOL_VERSION};
pub use notify::{notification, strip_notification, NOTIFY_MARKER};
pub use rpc::{ErrorResponse, Request, Response, RpcMessage};
pub use specs::{CommandSpec, KeyBindingSpec, MajorModeSpec, MinorModeSpec};
