//! End-to-end tests: the diff plugin behind a full bridge, driven by a host
//! with an in-memory editor on the other side.

use std::sync::Arc;

use quill_host::{MemoryHost, PluginClient};
use quill_mux::Broker;
use quill_proto::notify::strip_notification;
use quill_sdk::{Host, Plugin, PluginServer};

use quill_diff_plugin::BufferDiffPlugin;

/// Full bridge over an in-memory transport: diff plugin served on one side,
/// [`PluginClient`] on the other.
fn bridge() -> (PluginClient, Broker, Broker) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let (host_broker, host_primary) = Broker::new(a);
    let (plugin_broker, plugin_primary) = Broker::new(b);

    let server = Arc::new(PluginServer::new(
        Arc::new(BufferDiffPlugin::new()),
        plugin_broker.clone(),
    ));
    tokio::spawn(async move {
        let _ = quill_mux::serve(plugin_primary, server).await;
    });

    let client = PluginClient::new(host_broker.clone(), host_primary);
    (client, host_broker, plugin_broker)
}

async fn ready_bridge(host: &Arc<MemoryHost>) -> (PluginClient, Broker, Broker) {
    let (client, hb, pb) = bridge();
    client.initialize(host.clone()).await.unwrap();
    (client, hb, pb)
}

fn user_message(err: &quill_sdk::PluginError) -> String {
    let text = err.to_string();
    strip_notification(&text)
        .unwrap_or_else(|| panic!("expected a user notification, got: {text}"))
        .to_string()
}

#[tokio::test]
async fn plugin_identifies_itself() {
    let (client, _hb, _pb) = bridge();
    assert_eq!(client.name().await, "buffer-diff-plugin");
    assert_eq!(client.version().await, "1.0.0");
}

#[tokio::test]
async fn registered_commands_cross_the_bridge() {
    let (client, _hb, _pb) = bridge();
    let commands = client.commands().await;
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].name, "buffer-diff");
    assert_eq!(
        commands[0].arg_prompts,
        vec!["Compare buffer: ", "With buffer: "]
    );
    assert_eq!(commands[1].name, "buffer-diff-current");
    assert_eq!(
        commands[1].arg_prompts,
        vec!["Compare current buffer with: "]
    );
}

#[tokio::test]
async fn buffer_diff_creates_and_switches_to_the_diff_buffer() {
    let host = Arc::new(MemoryHost::new());
    host.add_buffer("a.txt", "one\ntwo\nthree");
    host.add_buffer("b.txt", "one\n2\nthree");
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command(
            "buffer-diff",
            vec!["a.txt".into(), "b.txt".into()],
        )
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "Buffer diff completed: 2 differences found"
    );

    let diff = host.find_buffer("*Diff: a.txt <-> b.txt*").await.unwrap();
    assert_eq!(
        diff.content(),
        "--- a.txt\n+++ b.txt\n\n one\n-two\n+2\n three"
    );
    assert_eq!(
        host.current_buffer_name().as_deref(),
        Some("*Diff: a.txt <-> b.txt*")
    );
}

#[tokio::test]
async fn rerunning_a_diff_reuses_the_diff_buffer() {
    let host = Arc::new(MemoryHost::new());
    host.add_buffer("a.txt", "same");
    host.add_buffer("b.txt", "same");
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command("buffer-diff", vec!["a.txt".into(), "b.txt".into()])
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "Buffer diff completed: 0 differences found"
    );

    // Change one side and diff again; the same buffer gets the new content.
    let b = host.find_buffer("b.txt").await.unwrap();
    b.set_content("different").await;

    let err = client
        .execute_command("buffer-diff", vec!["a.txt".into(), "b.txt".into()])
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "Buffer diff completed: 2 differences found"
    );

    let diff = host.find_buffer("*Diff: a.txt <-> b.txt*").await.unwrap();
    assert_eq!(
        diff.content(),
        "--- a.txt\n+++ b.txt\n\n-same\n+different"
    );
}

#[tokio::test]
async fn buffer_diff_current_uses_the_current_buffer() {
    let host = Arc::new(MemoryHost::new());
    host.add_buffer("current.txt", "x");
    host.add_buffer("other.txt", "y");
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command("buffer-diff-current", vec!["other.txt".into()])
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "Buffer diff completed: 2 differences found"
    );
    assert!(host
        .find_buffer("*Diff: current.txt <-> other.txt*")
        .await
        .is_some());
}

#[tokio::test]
async fn diff_current_without_buffers_notifies() {
    let host = Arc::new(MemoryHost::new());
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command("buffer-diff-current", vec!["other.txt".into()])
        .await
        .unwrap_err();
    assert_eq!(user_message(&err), "No current buffer");
}

#[tokio::test]
async fn missing_buffers_notify_by_name() {
    let host = Arc::new(MemoryHost::new());
    host.add_buffer("a.txt", "");
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command(
            "buffer-diff",
            vec!["a.txt".into(), "nonexistent-buffer-xyz".into()],
        )
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "Buffer not found: nonexistent-buffer-xyz"
    );
}

#[tokio::test]
async fn argument_count_errors_cross_the_bridge() {
    let host = Arc::new(MemoryHost::new());
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command("buffer-diff", vec!["only-one".into()])
        .await
        .unwrap_err();
    assert_eq!(user_message(&err), "buffer-diff requires 2 buffer names");

    let err = client
        .execute_command("buffer-diff-current", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(
        user_message(&err),
        "buffer-diff-current requires 1 buffer name"
    );
}

#[tokio::test]
async fn unknown_commands_are_errors_not_notifications() {
    let host = Arc::new(MemoryHost::new());
    let (client, _hb, _pb) = ready_bridge(&host).await;

    let err = client
        .execute_command("no-such-command", Vec::new())
        .await
        .unwrap_err();
    assert!(strip_notification(&err.to_string()).is_none());
    assert!(err.to_string().contains("unknown command: no-such-command"));
}
