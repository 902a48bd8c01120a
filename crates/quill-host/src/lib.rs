//! Quill host side of the plugin bridge.
//!
//! The host launches a plugin executable, reads its handshake line, connects
//! the bridge transport, and from then on talks to the plugin through
//! [`PluginClient`] — an RPC-backed implementation of the same [`Plugin`]
//! trait an in-process plugin would implement. Calls the plugin makes back
//! into the editor arrive at a [`HostServer`] wrapping whatever [`Host`]
//! implementation the embedding editor provides.
//!
//! [`Plugin`]: quill_sdk::Plugin
//! [`Host`]: quill_sdk::Host

pub mod client;
pub mod error;
pub mod host_server;
pub mod memory;
pub mod process;

pub use client::PluginClient;
pub use error::LaunchError;
pub use host_server::HostServer;
pub use memory::{MemoryBuffer, MemoryHost};
pub use process::PluginProcess;
