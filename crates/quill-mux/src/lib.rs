//! Quill transport broker.
//!
//! Multiplexes one physical stream between two processes into independently
//! addressable logical channels, and layers a request/response RPC protocol
//! on top of them:
//!
//! - [`Broker`]: owns the stream, routes frames, and provides the
//!   listen/accept/dial rendezvous for opening new channels from either side.
//! - [`Channel`]: one logical sub-connection.
//! - [`rpc::RpcClient`] / [`rpc::serve`]: correlated calls and concurrent
//!   request dispatch over a channel.
//!
//! Both sides can run a client and a server over the same stream at once,
//! which is what lets a plugin call back into its host while the host is
//! still waiting on the plugin's reply.

pub mod broker;
pub mod channel;
pub mod error;
pub mod rpc;

pub use broker::{Broker, Listener, DEFAULT_DIAL_TIMEOUT};
pub use channel::{Channel, ChannelReceiver, ChannelSender};
pub use error::{MuxError, RpcError};
pub use rpc::{parse_params, serve, to_json, RpcClient, Service};
