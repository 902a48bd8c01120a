//! Remote buffer handles.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use quill_mux::RpcClient;
use quill_proto::messages::{
    methods, BufferNameParams, DeleteRangeParams, InsertAtParams, SetContentParams,
    SetCursorParams,
};
use quill_proto::BufferInfo;

use crate::traits::Buffer;

/// A buffer handle backed by a snapshot plus the callback-channel client.
///
/// Accessors answer from the cached snapshot with no round trip, so a handle
/// can go stale if the host edits the buffer after the snapshot was taken —
/// an accepted limitation of the by-value buffer model. Mutators update the
/// cache optimistically and forward the edit to the host; a forwarding
/// failure is logged rather than raised, keeping the handle infallible.
pub struct RemoteBuffer {
    rpc: RpcClient,
    info: Mutex<BufferInfo>,
}

impl RemoteBuffer {
    /// Wraps a snapshot received over RPC. The empty-name sentinel means
    /// "not found" and yields `None` instead of a handle.
    #[must_use]
    pub fn from_info(rpc: RpcClient, info: BufferInfo) -> Option<Self> {
        if info.is_missing() {
            return None;
        }
        Some(Self {
            rpc,
            info: Mutex::new(info),
        })
    }

    async fn forward(&self, method: &str, params: Value) {
        if let Err(e) = self.rpc.call(method, params).await {
            tracing::warn!(method, error = %e, "buffer edit not forwarded to host");
        }
    }

    fn buffer_name(&self) -> String {
        self.info.lock().name.clone()
    }
}

#[async_trait]
impl Buffer for RemoteBuffer {
    fn name(&self) -> String {
        self.info.lock().name.clone()
    }

    fn content(&self) -> String {
        self.info.lock().content.clone()
    }

    fn cursor_position(&self) -> usize {
        self.info.lock().position
    }

    fn is_dirty(&self) -> bool {
        self.info.lock().is_dirty
    }

    fn filename(&self) -> String {
        self.info.lock().filename.clone()
    }

    async fn set_content(&self, content: &str) {
        let buffer = {
            let mut info = self.info.lock();
            info.content = content.to_string();
            info.is_dirty = true;
            info.name.clone()
        };
        let params = serde_json::to_value(SetContentParams {
            buffer,
            content: content.to_string(),
        })
        .unwrap_or(Value::Null);
        self.forward(methods::BUFFER_SET_CONTENT, params).await;
    }

    async fn insert_at(&self, position: usize, text: &str) {
        let buffer = {
            let mut info = self.info.lock();
            info.content = splice_chars(&info.content, position, position, text);
            info.is_dirty = true;
            info.name.clone()
        };
        let params = serde_json::to_value(InsertAtParams {
            buffer,
            position,
            text: text.to_string(),
        })
        .unwrap_or(Value::Null);
        self.forward(methods::BUFFER_INSERT_AT, params).await;
    }

    async fn delete_range(&self, start: usize, end: usize) {
        let buffer = {
            let mut info = self.info.lock();
            info.content = splice_chars(&info.content, start, end, "");
            info.is_dirty = true;
            info.name.clone()
        };
        let params = serde_json::to_value(DeleteRangeParams { buffer, start, end })
            .unwrap_or(Value::Null);
        self.forward(methods::BUFFER_DELETE_RANGE, params).await;
    }

    async fn set_cursor_position(&self, position: usize) {
        let buffer = {
            let mut info = self.info.lock();
            info.position = position;
            info.name.clone()
        };
        let params = serde_json::to_value(SetCursorParams { buffer, position })
            .unwrap_or(Value::Null);
        self.forward(methods::BUFFER_SET_CURSOR, params).await;
    }

    async fn mark_dirty(&self) {
        {
            self.info.lock().is_dirty = true;
        }
        let params = serde_json::to_value(BufferNameParams {
            name: self.buffer_name(),
        })
        .unwrap_or(Value::Null);
        self.forward(methods::BUFFER_MARK_DIRTY, params).await;
    }
}

/// Replaces the character range `[start, end)` of `content` with `text`.
/// Offsets are clamped to the content length.
pub fn splice_chars(content: &str, start: usize, end: usize, text: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let start = start.min(chars.len());
    let end = end.clamp(start, chars.len());

    let mut out = String::with_capacity(content.len() + text.len());
    out.extend(chars[..start].iter());
    out.push_str(text);
    out.extend(chars[end..].iter());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_inserts_mid_string() {
        assert_eq!(splice_chars("hello world", 5, 5, ","), "hello, world");
    }

    #[test]
    fn splice_deletes_range() {
        assert_eq!(splice_chars("hello world", 5, 11, ""), "hello");
    }

    #[test]
    fn splice_clamps_out_of_bounds() {
        assert_eq!(splice_chars("abc", 10, 20, "x"), "abcx");
        assert_eq!(splice_chars("abc", 2, 1, "x"), "abxc");
    }

    #[test]
    fn splice_counts_chars_not_bytes() {
        assert_eq!(splice_chars("héllo", 2, 2, "y"), "héyllo");
    }
}
