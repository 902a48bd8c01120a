//! Plugin process entry point.

use std::sync::Arc;

use tokio::net::TcpListener;

use quill_mux::Broker;
use quill_proto::{Handshake, COOKIE_ENV, COOKIE_VALUE};

use crate::error::ServeError;
use crate::server::PluginServer;
use crate::traits::Plugin;

/// Runs a plugin process until the host disconnects.
///
/// Bootstrap, in order: verify the magic cookie environment variable (so a
/// binary run by hand explains itself instead of hanging), bind a loopback
/// listener, print the handshake line to stdout, accept the host's single
/// connection, and serve the plugin's capability interface on the primary
/// channel. Logs go to stderr; stdout carries only the handshake line.
///
/// # Errors
///
/// Returns [`ServeError::NotAPluginEnvironment`] when launched outside a
/// host, or an IO error if the socket setup fails.
pub async fn serve(plugin: Arc<dyn Plugin>) -> Result<(), ServeError> {
    if std::env::var(COOKIE_ENV).as_deref() != Ok(COOKIE_VALUE) {
        return Err(ServeError::NotAPluginEnvironment);
    }

    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;

    println!("{}", Handshake::new(addr));

    let (stream, peer) = listener.accept().await?;
    tracing::info!(%peer, "host connected");

    let (broker, primary) = Broker::new(stream);
    let server = PluginServer::new(plugin, broker);
    quill_mux::serve(primary, Arc::new(server)).await?;

    tracing::info!("transport closed, plugin shutting down");
    Ok(())
}
