//! Quill plugin SDK.
//!
//! A plugin implements the [`Plugin`] trait and hands an instance to
//! [`serve`]; everything else — the handshake line, the bridge transport,
//! serving the host's calls, and the proxy through which the plugin calls
//! back into the host — is taken care of here.
//!
//! The capability interfaces are structural: plugin logic receives an
//! `Arc<dyn Host>` and never knows whether it holds the in-process editor or
//! the RPC proxy to a host in another process.

pub mod buffer_proxy;
pub mod error;
pub mod host_proxy;
pub mod server;
pub mod traits;

mod run;

pub use buffer_proxy::{splice_chars, RemoteBuffer};
pub use error::{HostError, PluginError, ServeError};
pub use host_proxy::RemoteHost;
pub use run::serve;
pub use server::PluginServer;
pub use traits::{Buffer, BufferHandle, Host, Plugin, Window, WindowHandle};
