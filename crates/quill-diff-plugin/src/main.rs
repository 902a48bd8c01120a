//! Buffer-diff plugin binary.
//!
//! Launched by a Quill host; prints the handshake line on stdout and serves
//! the bridge until the host disconnects. Logs go to stderr.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quill_diff_plugin::BufferDiffPlugin;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging to stderr; stdout belongs to the handshake.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=info")),
        )
        .init();

    if let Err(e) = quill_sdk::serve(Arc::new(BufferDiffPlugin::new())).await {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
