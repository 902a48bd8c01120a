//! Capability descriptors.
//!
//! A plugin describes its extension points with these value objects once at
//! registration time; the host copies them into its own registries and treats
//! them as read-only thereafter.

use serde::{Deserialize, Serialize};

/// One command the plugin offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Command name as invoked by the user (e.g., `buffer-diff`).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the command prompts the user for arguments.
    pub interactive: bool,
    /// Name of the plugin-side handler for this command.
    pub handler: String,
    /// Prompts shown for each argument, in order.
    #[serde(default)]
    pub arg_prompts: Vec<String>,
}

/// A major mode the plugin offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorModeSpec {
    /// Mode name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// File extensions this mode activates for.
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// A minor mode the plugin offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorModeSpec {
    /// Mode name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// A key binding the plugin offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindingSpec {
    /// Key sequence (e.g., `C-c d`).
    pub sequence: String,
    /// Command invoked by the sequence.
    pub command: String,
}
