//! The plugin-side host proxy.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use quill_mux::{Channel, RpcClient, RpcError};
use quill_proto::messages::{
    methods, AddHookParams, BufferNameParams, ExecuteCommandParams, ModeParams, OptionParams,
    PathParams, StatusParams, TriggerHookParams,
};
use quill_proto::BufferInfo;

use crate::buffer_proxy::RemoteBuffer;
use crate::error::HostError;
use crate::traits::{BufferHandle, Host, WindowHandle};

/// [`Host`] implementation that forwards every call over the callback
/// channel. Plugin logic uses it as if the editor were in-process.
pub struct RemoteHost {
    rpc: RpcClient,
}

impl RemoteHost {
    /// Wraps an established callback channel.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            rpc: RpcClient::new(channel),
        }
    }

    /// One call returning a buffer snapshot, converted to a handle. The
    /// empty-name sentinel and any transport failure both become `None`;
    /// transport failures are additionally logged.
    async fn fetch_buffer(&self, method: &str, params: Value) -> Option<BufferHandle> {
        let value = match self.rpc.call(method, params).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(method, error = %e, "host call failed");
                return None;
            }
        };
        let info: BufferInfo = match serde_json::from_value(value) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(method, error = %e, "malformed buffer snapshot");
                return None;
            }
        };
        RemoteBuffer::from_info(self.rpc.clone(), info).map(|b| Arc::new(b) as BufferHandle)
    }

    /// One fire-and-forget call; failures are logged, not raised.
    async fn notify_host(&self, method: &str, params: Value) {
        if let Err(e) = self.rpc.call(method, params).await {
            tracing::warn!(method, error = %e, "host call failed");
        }
    }

    /// One call whose only interesting outcome is success or an error.
    async fn unit_call(&self, method: &str, params: Value) -> Result<(), HostError> {
        self.rpc.call(method, params).await.map_err(host_err)?;
        Ok(())
    }
}

fn host_err(e: RpcError) -> HostError {
    match e {
        RpcError::Remote { message, .. } => HostError::Other(message),
        other => HostError::Rpc(other.to_string()),
    }
}

fn params_of<T: serde::Serialize>(params: T) -> Value {
    serde_json::to_value(params).unwrap_or(Value::Null)
}

#[async_trait]
impl Host for RemoteHost {
    async fn current_buffer(&self) -> Option<BufferHandle> {
        self.fetch_buffer(methods::HOST_CURRENT_BUFFER, Value::Null)
            .await
    }

    // Windows are not materialized over the bridge; see DESIGN.md.
    async fn current_window(&self) -> Option<WindowHandle> {
        tracing::debug!("current_window is not forwarded over the bridge");
        None
    }

    async fn set_status(&self, message: &str) {
        let params = params_of(StatusParams {
            message: message.to_string(),
        });
        self.notify_host(methods::HOST_SET_STATUS, params).await;
    }

    async fn show_message(&self, message: &str) {
        let params = params_of(StatusParams {
            message: message.to_string(),
        });
        self.notify_host(methods::HOST_SHOW_MESSAGE, params).await;
    }

    async fn execute_command(&self, name: &str, args: Vec<Value>) -> Result<(), HostError> {
        let params = params_of(ExecuteCommandParams {
            name: name.to_string(),
            args,
        });
        self.unit_call(methods::HOST_EXECUTE_COMMAND, params).await
    }

    async fn set_major_mode(&self, buffer: &str, mode: &str) -> Result<(), HostError> {
        let params = params_of(ModeParams {
            buffer: buffer.to_string(),
            mode: mode.to_string(),
        });
        self.unit_call(methods::HOST_SET_MAJOR_MODE, params).await
    }

    async fn toggle_minor_mode(&self, buffer: &str, mode: &str) -> Result<(), HostError> {
        let params = params_of(ModeParams {
            buffer: buffer.to_string(),
            mode: mode.to_string(),
        });
        self.unit_call(methods::HOST_TOGGLE_MINOR_MODE, params).await
    }

    async fn add_hook(&self, event: &str, handler: &str) {
        let params = params_of(AddHookParams {
            event: event.to_string(),
            handler: handler.to_string(),
        });
        self.notify_host(methods::HOST_ADD_HOOK, params).await;
    }

    async fn trigger_hook(&self, event: &str, args: Vec<Value>) {
        let params = params_of(TriggerHookParams {
            event: event.to_string(),
            args,
        });
        self.notify_host(methods::HOST_TRIGGER_HOOK, params).await;
    }

    async fn create_buffer(&self, name: &str) -> Option<BufferHandle> {
        let params = params_of(BufferNameParams {
            name: name.to_string(),
        });
        self.fetch_buffer(methods::HOST_CREATE_BUFFER, params).await
    }

    async fn find_buffer(&self, name: &str) -> Option<BufferHandle> {
        let params = params_of(BufferNameParams {
            name: name.to_string(),
        });
        self.fetch_buffer(methods::HOST_FIND_BUFFER, params).await
    }

    async fn switch_to_buffer(&self, name: &str) -> Result<(), HostError> {
        let params = params_of(BufferNameParams {
            name: name.to_string(),
        });
        self.unit_call(methods::HOST_SWITCH_BUFFER, params).await
    }

    async fn open_file(&self, path: &str) -> Result<(), HostError> {
        let params = params_of(PathParams {
            path: path.to_string(),
        });
        self.unit_call(methods::HOST_OPEN_FILE, params).await
    }

    async fn save_buffer(&self, name: &str) -> Result<(), HostError> {
        let params = params_of(BufferNameParams {
            name: name.to_string(),
        });
        self.unit_call(methods::HOST_SAVE_BUFFER, params).await
    }

    async fn get_option(&self, name: &str) -> Result<Value, HostError> {
        let params = params_of(OptionParams {
            name: name.to_string(),
            value: None,
        });
        self.rpc
            .call(methods::HOST_GET_OPTION, params)
            .await
            .map_err(host_err)
    }

    async fn set_option(&self, name: &str, value: Value) -> Result<(), HostError> {
        let params = params_of(OptionParams {
            name: name.to_string(),
            value: Some(value),
        });
        self.unit_call(methods::HOST_SET_OPTION, params).await
    }
}
