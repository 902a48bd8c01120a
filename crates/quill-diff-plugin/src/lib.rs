//! Buffer-diff plugin.
//!
//! Registers two commands with its host: `buffer-diff`, which compares two
//! named buffers, and `buffer-diff-current`, which compares the current
//! buffer with a named one. The comparison lands in a dedicated buffer
//! named `*Diff: a <-> b*`, the editor switches to it, and the user gets a
//! completion notice with the change count.

pub mod diff;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use quill_proto::{CommandSpec, KeyBindingSpec, MajorModeSpec, MinorModeSpec};
use quill_sdk::{BufferHandle, Host, Plugin, PluginError};

use crate::diff::{count_differences, simple_diff};

/// The plugin. Holds nothing but the host handle received at
/// initialization.
#[derive(Default)]
pub struct BufferDiffPlugin {
    host: RwLock<Option<Arc<dyn Host>>>,
}

impl BufferDiffPlugin {
    /// Creates an uninitialized plugin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn host(&self) -> Result<Arc<dyn Host>, PluginError> {
        self.host
            .read()
            .clone()
            .ok_or_else(|| PluginError::Message("plugin not initialized".to_string()))
    }

    async fn lookup(host: &Arc<dyn Host>, name: &str) -> Result<BufferHandle, PluginError> {
        host.find_buffer(name)
            .await
            .ok_or_else(|| PluginError::notify(format!("Buffer not found: {name}")))
    }

    /// Compares two named buffers and presents the result.
    ///
    /// On success this still returns an error value: the completion notice
    /// travels as a marker-prefixed notification, which is how command
    /// results reach the user's echo area.
    async fn buffer_diff(&self, first: &str, second: &str) -> Result<(), PluginError> {
        let host = self.host()?;

        let buffer1 = Self::lookup(&host, first).await?;
        let buffer2 = Self::lookup(&host, second).await?;

        let diff = simple_diff(first, &buffer1.content(), second, &buffer2.content());
        let differences = count_differences(&diff);

        let diff_name = format!("*Diff: {first} <-> {second}*");
        let diff_buffer = match host.find_buffer(&diff_name).await {
            Some(existing) => existing,
            None => host
                .create_buffer(&diff_name)
                .await
                .ok_or_else(|| PluginError::notify("Failed to create diff buffer"))?,
        };
        diff_buffer.set_content(&diff.join("\n")).await;

        host.switch_to_buffer(&diff_name)
            .await
            .map_err(|e| PluginError::notify(format!("Failed to switch to diff buffer: {e}")))?;

        Err(PluginError::notify(format!(
            "Buffer diff completed: {differences} differences found"
        )))
    }

    async fn buffer_diff_current(&self, other: &str) -> Result<(), PluginError> {
        let host = self.host()?;
        let current = host
            .current_buffer()
            .await
            .ok_or_else(|| PluginError::notify("No current buffer"))?;
        let current_name = current.name();
        self.buffer_diff(&current_name, other).await
    }
}

fn arg_str(args: &[Value], index: usize) -> Option<&str> {
    args.get(index).and_then(Value::as_str)
}

#[async_trait]
impl Plugin for BufferDiffPlugin {
    async fn name(&self) -> String {
        "buffer-diff-plugin".to_string()
    }

    async fn version(&self) -> String {
        "1.0.0".to_string()
    }

    async fn description(&self) -> String {
        "Compares buffers and shows their differences".to_string()
    }

    async fn initialize(&self, host: Arc<dyn Host>) -> Result<(), PluginError> {
        *self.host.write() = Some(host);
        tracing::info!("buffer-diff plugin initialized");
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), PluginError> {
        *self.host.write() = None;
        Ok(())
    }

    async fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec {
                name: "buffer-diff".to_string(),
                description: "Compare two buffers and show differences".to_string(),
                interactive: true,
                handler: "HandleBufferDiff".to_string(),
                arg_prompts: vec!["Compare buffer: ".to_string(), "With buffer: ".to_string()],
            },
            CommandSpec {
                name: "buffer-diff-current".to_string(),
                description: "Compare current buffer with another buffer".to_string(),
                interactive: true,
                handler: "HandleBufferDiffCurrent".to_string(),
                arg_prompts: vec!["Compare current buffer with: ".to_string()],
            },
        ]
    }

    async fn major_modes(&self) -> Vec<MajorModeSpec> {
        Vec::new()
    }

    async fn minor_modes(&self) -> Vec<MinorModeSpec> {
        Vec::new()
    }

    async fn key_bindings(&self) -> Vec<KeyBindingSpec> {
        Vec::new()
    }

    fn supports_command_execution(&self) -> bool {
        true
    }

    async fn execute_command(&self, name: &str, args: Vec<Value>) -> Result<(), PluginError> {
        match name {
            "buffer-diff" => match (arg_str(&args, 0), arg_str(&args, 1)) {
                (Some(first), Some(second)) => self.buffer_diff(first, second).await,
                _ => Err(PluginError::notify("buffer-diff requires 2 buffer names")),
            },
            "buffer-diff-current" => match arg_str(&args, 0) {
                Some(other) => self.buffer_diff_current(other).await,
                None => Err(PluginError::notify(
                    "buffer-diff-current requires 1 buffer name",
                )),
            },
            other => Err(PluginError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[tokio::test]
    async fn command_specs_are_registered() {
        let plugin = BufferDiffPlugin::new();
        let commands = plugin.commands().await;
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
        assert!(commands.iter().all(|c| c.interactive));
    }

    #[tokio::test]
    async fn execute_before_initialize_fails() {
        let plugin = BufferDiffPlugin::new();
        let err = plugin
            .execute_command("buffer-diff", vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test_case("buffer-diff", &[], "buffer-diff requires 2 buffer names"; "diff with no args")]
    #[test_case("buffer-diff", &["only-one"], "buffer-diff requires 2 buffer names"; "diff with one arg")]
    #[test_case("buffer-diff-current", &[], "buffer-diff-current requires 1 buffer name"; "diff current with no args")]
    #[tokio::test]
    async fn missing_arguments_notify_the_user(command: &str, args: &[&str], expected: &str) {
        let plugin = BufferDiffPlugin::new();
        let args: Vec<Value> = args.iter().map(|a| Value::from(*a)).collect();

        let err = plugin.execute_command(command, args).await.unwrap_err();
        assert_eq!(
            quill_proto::notify::strip_notification(&err.to_string()),
            Some(expected)
        );
    }

    #[tokio::test]
    async fn unknown_commands_are_plain_errors() {
        let plugin = BufferDiffPlugin::new();
        let err = plugin
            .execute_command("no-such-command", Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown command: no-such-command");
        assert!(quill_proto::notify::strip_notification(&err.to_string()).is_none());
    }
}
