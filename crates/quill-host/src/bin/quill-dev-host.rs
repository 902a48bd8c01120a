//! Quill Development Host
//!
//! Launches a plugin executable against an in-memory editor and reports what
//! the plugin registers. Useful for smoke-testing a plugin binary without a
//! full editor:
//!
//! ```bash
//! quill-dev-host target/debug/quill-diff-plugin \
//!     --buffer a.txt=demos/a.txt --run buffer-diff --arg a.txt --arg b.txt
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quill_host::{MemoryHost, PluginProcess};
use quill_proto::notify::strip_notification;
use quill_sdk::Plugin as _;

#[derive(Debug, Parser)]
#[command(name = "quill-dev-host", about = "Run a Quill plugin against an in-memory editor")]
struct Args {
    /// Path to the plugin executable.
    plugin: PathBuf,

    /// Seed a buffer, either `name` (empty) or `name=path` (file content).
    #[arg(long = "buffer")]
    buffers: Vec<String>,

    /// Command to execute after initialization.
    #[arg(long)]
    run: Option<String>,

    /// Positional argument for --run; repeatable.
    #[arg(long = "arg")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging to stderr so stdout stays readable output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=info")),
        )
        .init();

    let args = Args::parse();

    let host = Arc::new(MemoryHost::new());
    for seed in &args.buffers {
        match seed.split_once('=') {
            Some((name, path)) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading buffer seed {path}"))?;
                host.add_buffer(name, &content);
            }
            None => {
                host.add_buffer(seed, "");
            }
        }
    }

    let process = PluginProcess::launch(&args.plugin)
        .await
        .context("launching plugin")?;
    let client = process.client();

    println!(
        "plugin: {} v{} - {}",
        client.name().await,
        client.version().await,
        client.description().await
    );

    client
        .initialize(host.clone())
        .await
        .context("initializing plugin")?;

    for command in client.commands().await {
        println!("command: {} ({})", command.name, command.description);
    }
    for mode in client.major_modes().await {
        println!("major mode: {}", mode.name);
    }
    for binding in client.key_bindings().await {
        println!("binding: {} -> {}", binding.sequence, binding.command);
    }

    if let Some(name) = &args.run {
        let call_args: Vec<Value> = args
            .args
            .iter()
            .map(|a| Value::String(a.clone()))
            .collect();
        match client.execute_command(name, call_args).await {
            Ok(()) => println!("{name}: ok"),
            Err(e) => {
                let text = e.to_string();
                match strip_notification(&text) {
                    Some(message) => println!("{message}"),
                    None => println!("{name}: failed: {text}"),
                }
            }
        }
        let status = host.status();
        if !status.is_empty() {
            println!("status: {status}");
        }
        for message in host.messages() {
            println!("message: {message}");
        }
    }

    process.shutdown().await.context("shutting down plugin")?;
    Ok(())
}
