//! Capability interfaces.
//!
//! Both sides of the bridge are modeled as method sets: the host sees a
//! plugin through [`Plugin`], the plugin sees its host through [`Host`], and
//! buffers travel as [`Buffer`] handles. The RPC proxies and the in-process
//! implementations are interchangeable behind these traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use quill_proto::{CommandSpec, KeyBindingSpec, MajorModeSpec, MinorModeSpec};

use crate::error::{HostError, PluginError};

/// Shared handle to a buffer.
pub type BufferHandle = Arc<dyn Buffer>;

/// Shared handle to a window.
pub type WindowHandle = Arc<dyn Window>;

/// A text buffer.
///
/// Accessors are synchronous: a remote handle answers them from its local
/// snapshot with no round trip, so they cannot fail. Mutators are
/// asynchronous because a remote handle forwards each edit to the host.
#[async_trait]
pub trait Buffer: Send + Sync {
    /// Buffer name.
    fn name(&self) -> String;
    /// Full text content.
    fn content(&self) -> String;
    /// Cursor offset in characters.
    fn cursor_position(&self) -> usize;
    /// Whether the buffer has unsaved changes.
    fn is_dirty(&self) -> bool;
    /// Backing file path, empty for scratch buffers.
    fn filename(&self) -> String;

    /// Replaces the entire content.
    async fn set_content(&self, content: &str);
    /// Inserts text at a character offset.
    async fn insert_at(&self, position: usize, text: &str);
    /// Deletes the character range `[start, end)`.
    async fn delete_range(&self, start: usize, end: usize);
    /// Moves the cursor.
    async fn set_cursor_position(&self, position: usize);
    /// Flags the buffer as having unsaved changes.
    async fn mark_dirty(&self);
}

/// An editor window.
pub trait Window: Send + Sync {
    /// Name of the buffer the window displays.
    fn buffer_name(&self) -> String;
}

/// The capability set a host exposes to plugins.
#[async_trait]
pub trait Host: Send + Sync {
    /// Returns the buffer the user is editing, if any.
    async fn current_buffer(&self) -> Option<BufferHandle>;

    /// Returns the focused window, if any.
    async fn current_window(&self) -> Option<WindowHandle>;

    /// Sets the status line text.
    async fn set_status(&self, message: &str);

    /// Shows a message in the echo area.
    async fn show_message(&self, message: &str);

    /// Runs a host command by name.
    async fn execute_command(&self, name: &str, args: Vec<Value>) -> Result<(), HostError>;

    /// Sets the major mode of a buffer.
    async fn set_major_mode(&self, buffer: &str, mode: &str) -> Result<(), HostError>;

    /// Toggles a minor mode on a buffer.
    async fn toggle_minor_mode(&self, buffer: &str, mode: &str) -> Result<(), HostError>;

    /// Registers a named handler for an editor event. Handlers cross the
    /// bridge by name, not as closures.
    async fn add_hook(&self, event: &str, handler: &str);

    /// Fires an editor event.
    async fn trigger_hook(&self, event: &str, args: Vec<Value>);

    /// Creates a buffer, returning its handle; `None` if creation failed.
    async fn create_buffer(&self, name: &str) -> Option<BufferHandle>;

    /// Looks up a buffer by name; `None` if it does not exist.
    async fn find_buffer(&self, name: &str) -> Option<BufferHandle>;

    /// Makes the named buffer current.
    async fn switch_to_buffer(&self, name: &str) -> Result<(), HostError>;

    /// Opens a file into a buffer.
    async fn open_file(&self, path: &str) -> Result<(), HostError>;

    /// Saves the named buffer to its backing file.
    async fn save_buffer(&self, name: &str) -> Result<(), HostError>;

    /// Reads an editor option.
    async fn get_option(&self, name: &str) -> Result<Value, HostError>;

    /// Writes an editor option.
    async fn set_option(&self, name: &str, value: Value) -> Result<(), HostError>;
}

/// The capability set a plugin exposes to its host.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name.
    async fn name(&self) -> String;
    /// Plugin version.
    async fn version(&self) -> String;
    /// Human-readable description.
    async fn description(&self) -> String;

    /// Called once after the bridge is up; `host` is the plugin's handle for
    /// calling back into the editor. Must complete before any method that
    /// uses the host is invoked.
    async fn initialize(&self, host: Arc<dyn Host>) -> Result<(), PluginError>;

    /// Called before the plugin is unloaded.
    async fn cleanup(&self) -> Result<(), PluginError>;

    /// Commands this plugin registers.
    async fn commands(&self) -> Vec<CommandSpec>;
    /// Major modes this plugin registers.
    async fn major_modes(&self) -> Vec<MajorModeSpec>;
    /// Minor modes this plugin registers.
    async fn minor_modes(&self) -> Vec<MinorModeSpec>;
    /// Key bindings this plugin registers.
    async fn key_bindings(&self) -> Vec<KeyBindingSpec>;

    /// Explicit capability probe: whether [`Plugin::execute_command`] is
    /// implemented. Checked before forwarding so an unsupporting plugin
    /// yields a clean negative instead of a failed call.
    fn supports_command_execution(&self) -> bool {
        false
    }

    /// Runs a registered command with positional arguments.
    async fn execute_command(&self, name: &str, args: Vec<Value>) -> Result<(), PluginError> {
        let _ = (name, args);
        Err(PluginError::UnsupportedExecution)
    }

    /// Completion candidates for a command argument prefix.
    async fn completions(&self, command: &str, prefix: &str) -> Vec<String> {
        let _ = (command, prefix);
        Vec::new()
    }
}
