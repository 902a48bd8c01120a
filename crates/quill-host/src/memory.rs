//! In-memory host implementation.
//!
//! A complete, editor-free [`Host`] backed by hash maps. The dev harness
//! uses it to drive real plugins, and the integration tests use it as the
//! editor stand-in on the host side of the bridge.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use quill_sdk::{splice_chars, Buffer, BufferHandle, Host, HostError, WindowHandle};

/// A buffer held entirely in memory.
pub struct MemoryBuffer {
    name: String,
    state: Mutex<BufferState>,
}

struct BufferState {
    content: String,
    position: usize,
    is_dirty: bool,
    filename: String,
}

impl MemoryBuffer {
    fn new(name: &str, content: &str, filename: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Mutex::new(BufferState {
                content: content.to_string(),
                position: 0,
                is_dirty: false,
                filename: filename.to_string(),
            }),
        })
    }
}

#[async_trait]
impl Buffer for MemoryBuffer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn content(&self) -> String {
        self.state.lock().content.clone()
    }

    fn cursor_position(&self) -> usize {
        self.state.lock().position
    }

    fn is_dirty(&self) -> bool {
        self.state.lock().is_dirty
    }

    fn filename(&self) -> String {
        self.state.lock().filename.clone()
    }

    async fn set_content(&self, content: &str) {
        let mut state = self.state.lock();
        state.content = content.to_string();
        state.is_dirty = true;
    }

    async fn insert_at(&self, position: usize, text: &str) {
        let mut state = self.state.lock();
        state.content = splice_chars(&state.content, position, position, text);
        state.is_dirty = true;
    }

    async fn delete_range(&self, start: usize, end: usize) {
        let mut state = self.state.lock();
        state.content = splice_chars(&state.content, start, end, "");
        state.is_dirty = true;
    }

    async fn set_cursor_position(&self, position: usize) {
        self.state.lock().position = position;
    }

    async fn mark_dirty(&self) {
        self.state.lock().is_dirty = true;
    }
}

/// An in-memory editor state: named buffers, a current buffer, a status
/// line, echo messages, options, and recorded hooks.
#[derive(Default)]
pub struct MemoryHost {
    buffers: Mutex<HashMap<String, Arc<MemoryBuffer>>>,
    current: Mutex<Option<String>>,
    status: Mutex<String>,
    messages: Mutex<Vec<String>>,
    options: Mutex<HashMap<String, Value>>,
    hooks: Mutex<Vec<(String, String)>>,
    events: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MemoryHost {
    /// Creates an empty host with no buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scratch buffer with the given content. The first buffer added
    /// becomes current.
    pub fn add_buffer(&self, name: &str, content: &str) -> BufferHandle {
        self.insert(MemoryBuffer::new(name, content, ""))
    }

    /// Adds a buffer backed by a named file.
    pub fn add_file_buffer(&self, name: &str, content: &str, filename: &str) -> BufferHandle {
        self.insert(MemoryBuffer::new(name, content, filename))
    }

    fn insert(&self, buffer: Arc<MemoryBuffer>) -> BufferHandle {
        let name = buffer.name.clone();
        self.buffers.lock().insert(name.clone(), buffer.clone());
        let mut current = self.current.lock();
        if current.is_none() {
            *current = Some(name);
        }
        buffer
    }

    /// Current status line text.
    #[must_use]
    pub fn status(&self) -> String {
        self.status.lock().clone()
    }

    /// Echo-area messages shown so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Name of the current buffer, if any.
    #[must_use]
    pub fn current_buffer_name(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Registered `(event, handler)` pairs, oldest first.
    #[must_use]
    pub fn hooks(&self) -> Vec<(String, String)> {
        self.hooks.lock().clone()
    }

    /// Fired `(event, args)` pairs, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Vec<Value>)> {
        self.events.lock().clone()
    }

    fn get(&self, name: &str) -> Option<Arc<MemoryBuffer>> {
        self.buffers.lock().get(name).cloned()
    }
}

#[async_trait]
impl Host for MemoryHost {
    async fn current_buffer(&self) -> Option<BufferHandle> {
        let name = self.current.lock().clone()?;
        self.get(&name).map(|b| b as BufferHandle)
    }

    async fn current_window(&self) -> Option<WindowHandle> {
        None
    }

    async fn set_status(&self, message: &str) {
        *self.status.lock() = message.to_string();
    }

    async fn show_message(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    async fn execute_command(&self, name: &str, _args: Vec<Value>) -> Result<(), HostError> {
        Err(HostError::Other(format!("unknown host command: {name}")))
    }

    async fn set_major_mode(&self, buffer: &str, _mode: &str) -> Result<(), HostError> {
        self.get(buffer)
            .map(|_| ())
            .ok_or_else(|| HostError::BufferNotFound(buffer.to_string()))
    }

    async fn toggle_minor_mode(&self, buffer: &str, _mode: &str) -> Result<(), HostError> {
        self.get(buffer)
            .map(|_| ())
            .ok_or_else(|| HostError::BufferNotFound(buffer.to_string()))
    }

    async fn add_hook(&self, event: &str, handler: &str) {
        self.hooks
            .lock()
            .push((event.to_string(), handler.to_string()));
    }

    async fn trigger_hook(&self, event: &str, args: Vec<Value>) {
        self.events.lock().push((event.to_string(), args));
    }

    async fn create_buffer(&self, name: &str) -> Option<BufferHandle> {
        let buffer = MemoryBuffer::new(name, "", "");
        self.buffers
            .lock()
            .insert(name.to_string(), buffer.clone());
        Some(buffer as BufferHandle)
    }

    async fn find_buffer(&self, name: &str) -> Option<BufferHandle> {
        self.get(name).map(|b| b as BufferHandle)
    }

    async fn switch_to_buffer(&self, name: &str) -> Result<(), HostError> {
        if self.get(name).is_none() {
            return Err(HostError::BufferNotFound(name.to_string()));
        }
        *self.current.lock() = Some(name.to_string());
        Ok(())
    }

    // No filesystem behind this host; an opened file is an empty buffer
    // remembering its path.
    async fn open_file(&self, path: &str) -> Result<(), HostError> {
        let buffer = MemoryBuffer::new(path, "", path);
        self.buffers.lock().insert(path.to_string(), buffer);
        Ok(())
    }

    async fn save_buffer(&self, name: &str) -> Result<(), HostError> {
        let buffer = self
            .get(name)
            .ok_or_else(|| HostError::BufferNotFound(name.to_string()))?;
        buffer.state.lock().is_dirty = false;
        Ok(())
    }

    async fn get_option(&self, name: &str) -> Result<Value, HostError> {
        self.options
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownOption(name.to_string()))
    }

    async fn set_option(&self, name: &str, value: Value) -> Result<(), HostError> {
        self.options.lock().insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_buffer_becomes_current() {
        let host = MemoryHost::new();
        host.add_buffer("one", "");
        host.add_buffer("two", "");
        assert_eq!(host.current_buffer_name().as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn switch_requires_existing_buffer() {
        let host = MemoryHost::new();
        host.add_buffer("one", "");
        assert!(host.switch_to_buffer("two").await.is_err());
        host.add_buffer("two", "");
        host.switch_to_buffer("two").await.unwrap();
        assert_eq!(host.current_buffer_name().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn edits_mark_dirty_and_save_clears() {
        let host = MemoryHost::new();
        let buffer = host.add_buffer("b", "hello");
        buffer.insert_at(5, " world").await;
        assert_eq!(buffer.content(), "hello world");
        assert!(buffer.is_dirty());
        host.save_buffer("b").await.unwrap();
        assert!(!buffer.is_dirty());
    }

    #[tokio::test]
    async fn options_round_trip() {
        let host = MemoryHost::new();
        assert!(host.get_option("tab-width").await.is_err());
        host.set_option("tab-width", Value::from(4)).await.unwrap();
        assert_eq!(host.get_option("tab-width").await.unwrap(), Value::from(4));
    }
}
