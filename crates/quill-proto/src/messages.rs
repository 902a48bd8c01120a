//! Method names and typed parameter payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name constants for both call directions.
pub mod methods {
    // Primary channel: host -> plugin
    pub const PLUGIN_NAME: &str = "plugin_name";
    pub const PLUGIN_VERSION: &str = "plugin_version";
    pub const PLUGIN_DESCRIPTION: &str = "plugin_description";
    pub const PLUGIN_INITIALIZE: &str = "plugin_initialize";
    pub const PLUGIN_CLEANUP: &str = "plugin_cleanup";
    pub const PLUGIN_COMMANDS: &str = "plugin_commands";
    pub const PLUGIN_MAJOR_MODES: &str = "plugin_major_modes";
    pub const PLUGIN_MINOR_MODES: &str = "plugin_minor_modes";
    pub const PLUGIN_KEY_BINDINGS: &str = "plugin_key_bindings";
    pub const PLUGIN_EXECUTE_COMMAND: &str = "plugin_execute_command";
    pub const PLUGIN_COMPLETIONS: &str = "plugin_completions";

    // Callback channel: plugin -> host
    pub const HOST_SET_STATUS: &str = "host_set_status";
    pub const HOST_SHOW_MESSAGE: &str = "host_show_message";
    pub const HOST_EXECUTE_COMMAND: &str = "host_execute_command";
    pub const HOST_SET_MAJOR_MODE: &str = "host_set_major_mode";
    pub const HOST_TOGGLE_MINOR_MODE: &str = "host_toggle_minor_mode";
    pub const HOST_ADD_HOOK: &str = "host_add_hook";
    pub const HOST_TRIGGER_HOOK: &str = "host_trigger_hook";
    pub const HOST_CREATE_BUFFER: &str = "host_create_buffer";
    pub const HOST_FIND_BUFFER: &str = "host_find_buffer";
    pub const HOST_CURRENT_BUFFER: &str = "host_current_buffer";
    pub const HOST_SWITCH_BUFFER: &str = "host_switch_buffer";
    pub const HOST_OPEN_FILE: &str = "host_open_file";
    pub const HOST_SAVE_BUFFER: &str = "host_save_buffer";
    pub const HOST_GET_OPTION: &str = "host_get_option";
    pub const HOST_SET_OPTION: &str = "host_set_option";

    // Callback channel: buffer edits, addressed by buffer name
    pub const BUFFER_SET_CONTENT: &str = "buffer_set_content";
    pub const BUFFER_INSERT_AT: &str = "buffer_insert_at";
    pub const BUFFER_DELETE_RANGE: &str = "buffer_delete_range";
    pub const BUFFER_SET_CURSOR: &str = "buffer_set_cursor";
    pub const BUFFER_MARK_DIRTY: &str = "buffer_mark_dirty";
}

/// Parameters for `plugin_initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    /// Broker channel id the host is accepting the callback connection on.
    pub callback_channel: u32,
}

/// Parameters for `plugin_execute_command` and `host_execute_command`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteCommandParams {
    /// Command name.
    pub name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Parameters for `plugin_completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionsParams {
    /// Command being completed.
    pub command: String,
    /// Prefix typed so far.
    pub prefix: String,
}

/// Parameters for `host_set_status` and `host_show_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusParams {
    /// Text to display.
    pub message: String,
}

/// Parameters for methods addressing a buffer by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferNameParams {
    /// Buffer name.
    pub name: String,
}

/// Parameters for `host_open_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathParams {
    /// Filesystem path.
    pub path: String,
}

/// Parameters for `host_set_major_mode` and `host_toggle_minor_mode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeParams {
    /// Buffer the mode applies to.
    pub buffer: String,
    /// Mode name.
    pub mode: String,
}

/// Parameters for `host_add_hook`.
///
/// Hooks cross the process boundary by handler name; closures cannot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHookParams {
    /// Event name.
    pub event: String,
    /// Named handler to invoke on the plugin side.
    pub handler: String,
}

/// Parameters for `host_trigger_hook`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerHookParams {
    /// Event name.
    pub event: String,
    /// Event arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Parameters for `host_get_option` and `host_set_option`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionParams {
    /// Option name.
    pub name: String,
    /// New value; absent for reads.
    #[serde(default)]
    pub value: Option<Value>,
}

/// Parameters for `buffer_set_content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetContentParams {
    /// Buffer name.
    pub buffer: String,
    /// Replacement content.
    pub content: String,
}

/// Parameters for `buffer_insert_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertAtParams {
    /// Buffer name.
    pub buffer: String,
    /// Character offset to insert at.
    pub position: usize,
    /// Text to insert.
    pub text: String,
}

/// Parameters for `buffer_delete_range`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRangeParams {
    /// Buffer name.
    pub buffer: String,
    /// Start of the range, inclusive.
    pub start: usize,
    /// End of the range, exclusive.
    pub end: usize,
}

/// Parameters for `buffer_set_cursor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCursorParams {
    /// Buffer name.
    pub buffer: String,
    /// New cursor offset.
    pub position: usize,
}
