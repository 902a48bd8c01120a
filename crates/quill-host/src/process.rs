//! Plugin process lifecycle.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use quill_mux::Broker;
use quill_proto::{Handshake, COOKIE_ENV, COOKIE_VALUE};

use crate::client::PluginClient;
use crate::error::LaunchError;

/// How long a freshly spawned plugin gets to print its handshake line.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// A running plugin process with an established bridge.
///
/// Dropping the process kills the child; prefer [`PluginProcess::shutdown`]
/// to give the plugin its cleanup call first.
pub struct PluginProcess {
    child: Child,
    client: PluginClient,
    broker: Broker,
}

impl PluginProcess {
    /// Spawns a plugin executable and brings the bridge up.
    ///
    /// The child gets the magic cookie in its environment and its stdio
    /// piped: stdout carries the handshake line, after which both stdout and
    /// stderr are drained into the log. Once the handshake is parsed and
    /// validated, the host connects to the advertised address and the
    /// bridge transport starts.
    ///
    /// # Errors
    ///
    /// Fails if the child cannot be spawned, prints no valid handshake
    /// within [`HANDSHAKE_TIMEOUT`], or the connection cannot be made. On
    /// any of these the child is killed on drop.
    pub async fn launch(program: impl AsRef<OsStr>) -> Result<Self, LaunchError> {
        let mut child = Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env(COOKIE_ENV, COOKIE_VALUE)
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child.stdout.take().ok_or(LaunchError::Stdio)?;
        let stderr = child.stderr.take().ok_or(LaunchError::Stdio)?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let line = timeout(HANDSHAKE_TIMEOUT, stdout_lines.next_line())
            .await
            .map_err(|_| LaunchError::HandshakeTimeout)??
            .ok_or(LaunchError::PluginExited)?;
        let handshake = Handshake::parse(&line)?;
        handshake.validate()?;
        tracing::debug!(addr = %handshake.addr, "plugin handshake accepted");

        let stream = TcpStream::connect(handshake.addr).await?;

        // Anything the plugin prints after the handshake goes to the log.
        tokio::spawn(forward_lines("stdout", stdout_lines));
        tokio::spawn(forward_lines("stderr", BufReader::new(stderr).lines()));

        let (broker, primary) = Broker::new(stream);
        let client = PluginClient::new(broker.clone(), primary);
        Ok(Self {
            child,
            client,
            broker,
        })
    }

    /// The call interface to the running plugin.
    #[must_use]
    pub fn client(&self) -> &PluginClient {
        &self.client
    }

    /// Gives the plugin its cleanup call, then tears the bridge down and
    /// kills the child.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the child could not be killed; a failed
    /// cleanup call is logged, not raised, since the process is going away
    /// regardless.
    pub async fn shutdown(mut self) -> Result<(), LaunchError> {
        use quill_sdk::Plugin as _;

        if let Err(e) = self.client.cleanup().await {
            tracing::warn!(error = %e, "plugin cleanup failed");
        }
        self.broker.close();
        self.child.kill().await?;
        Ok(())
    }
}

async fn forward_lines<R>(stream: &'static str, mut lines: Lines<BufReader<R>>)
where
    R: AsyncRead + Unpin,
{
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::info!(target: "quill_host::plugin", stream, "{line}");
    }
}
