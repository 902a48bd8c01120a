//! The host-side callback server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use quill_mux::{parse_params, to_json, RpcError, Service};
use quill_proto::messages::{
    methods, AddHookParams, BufferNameParams, DeleteRangeParams, ExecuteCommandParams,
    InsertAtParams, ModeParams, OptionParams, PathParams, SetContentParams, SetCursorParams,
    StatusParams, TriggerHookParams,
};
use quill_proto::BufferInfo;
use quill_sdk::{BufferHandle, Host, HostError};

/// Serves the editor's capability interface on the callback channel.
///
/// Buffer handles do not cross the bridge; lookups answer with a
/// [`BufferInfo`] snapshot, and a miss on `host_find_buffer` or
/// `host_current_buffer` answers with the empty-name sentinel rather than an
/// error, because "not there" is an ordinary outcome for those two. Buffer
/// edit methods address their target by name and re-resolve it per call.
pub struct HostServer {
    host: Arc<dyn Host>,
}

impl HostServer {
    /// Wraps the editor's host implementation.
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    fn snapshot(buffer: &BufferHandle) -> BufferInfo {
        BufferInfo {
            name: buffer.name(),
            content: buffer.content(),
            position: buffer.cursor_position(),
            is_dirty: buffer.is_dirty(),
            filename: buffer.filename(),
        }
    }

    /// Resolves the target of a buffer edit. Unlike lookups, edits on a
    /// vanished buffer are a real error the plugin should hear about.
    async fn edit_target(&self, name: &str) -> Result<BufferHandle, RpcError> {
        self.host
            .find_buffer(name)
            .await
            .ok_or_else(|| RpcError::NotFound(format!("buffer {name}")))
    }
}

fn host_to_rpc(e: HostError) -> RpcError {
    match e {
        HostError::BufferNotFound(name) => RpcError::NotFound(format!("buffer {name}")),
        HostError::UnknownOption(name) => RpcError::NotFound(format!("option {name}")),
        other => RpcError::Internal(other.to_string()),
    }
}

#[async_trait]
impl Service for HostServer {
    async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            methods::HOST_SET_STATUS => {
                let p: StatusParams = parse_params(params)?;
                self.host.set_status(&p.message).await;
                Ok(Value::Null)
            }
            methods::HOST_SHOW_MESSAGE => {
                let p: StatusParams = parse_params(params)?;
                self.host.show_message(&p.message).await;
                Ok(Value::Null)
            }
            methods::HOST_EXECUTE_COMMAND => {
                let p: ExecuteCommandParams = parse_params(params)?;
                self.host
                    .execute_command(&p.name, p.args)
                    .await
                    .map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_SET_MAJOR_MODE => {
                let p: ModeParams = parse_params(params)?;
                self.host
                    .set_major_mode(&p.buffer, &p.mode)
                    .await
                    .map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_TOGGLE_MINOR_MODE => {
                let p: ModeParams = parse_params(params)?;
                self.host
                    .toggle_minor_mode(&p.buffer, &p.mode)
                    .await
                    .map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_ADD_HOOK => {
                let p: AddHookParams = parse_params(params)?;
                self.host.add_hook(&p.event, &p.handler).await;
                Ok(Value::Null)
            }
            methods::HOST_TRIGGER_HOOK => {
                let p: TriggerHookParams = parse_params(params)?;
                self.host.trigger_hook(&p.event, p.args).await;
                Ok(Value::Null)
            }
            methods::HOST_CREATE_BUFFER => {
                let p: BufferNameParams = parse_params(params)?;
                match self.host.create_buffer(&p.name).await {
                    Some(buffer) => to_json(Self::snapshot(&buffer)),
                    None => Err(RpcError::Internal(format!(
                        "failed to create buffer {}",
                        p.name
                    ))),
                }
            }
            methods::HOST_FIND_BUFFER => {
                let p: BufferNameParams = parse_params(params)?;
                let info = match self.host.find_buffer(&p.name).await {
                    Some(buffer) => Self::snapshot(&buffer),
                    None => BufferInfo::missing(),
                };
                to_json(info)
            }
            methods::HOST_CURRENT_BUFFER => {
                let info = match self.host.current_buffer().await {
                    Some(buffer) => Self::snapshot(&buffer),
                    None => BufferInfo::missing(),
                };
                to_json(info)
            }
            methods::HOST_SWITCH_BUFFER => {
                let p: BufferNameParams = parse_params(params)?;
                self.host
                    .switch_to_buffer(&p.name)
                    .await
                    .map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_OPEN_FILE => {
                let p: PathParams = parse_params(params)?;
                self.host.open_file(&p.path).await.map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_SAVE_BUFFER => {
                let p: BufferNameParams = parse_params(params)?;
                self.host.save_buffer(&p.name).await.map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::HOST_GET_OPTION => {
                let p: OptionParams = parse_params(params)?;
                self.host.get_option(&p.name).await.map_err(host_to_rpc)
            }
            methods::HOST_SET_OPTION => {
                let p: OptionParams = parse_params(params)?;
                self.host
                    .set_option(&p.name, p.value.unwrap_or(Value::Null))
                    .await
                    .map_err(host_to_rpc)?;
                Ok(Value::Null)
            }
            methods::BUFFER_SET_CONTENT => {
                let p: SetContentParams = parse_params(params)?;
                self.edit_target(&p.buffer).await?.set_content(&p.content).await;
                Ok(Value::Null)
            }
            methods::BUFFER_INSERT_AT => {
                let p: InsertAtParams = parse_params(params)?;
                self.edit_target(&p.buffer)
                    .await?
                    .insert_at(p.position, &p.text)
                    .await;
                Ok(Value::Null)
            }
            methods::BUFFER_DELETE_RANGE => {
                let p: DeleteRangeParams = parse_params(params)?;
                self.edit_target(&p.buffer)
                    .await?
                    .delete_range(p.start, p.end)
                    .await;
                Ok(Value::Null)
            }
            methods::BUFFER_SET_CURSOR => {
                let p: SetCursorParams = parse_params(params)?;
                self.edit_target(&p.buffer)
                    .await?
                    .set_cursor_position(p.position)
                    .await;
                Ok(Value::Null)
            }
            methods::BUFFER_MARK_DIRTY => {
                let p: BufferNameParams = parse_params(params)?;
                self.edit_target(&p.name).await?.mark_dirty().await;
                Ok(Value::Null)
            }
            _ => Err(RpcError::MethodNotFound(method.to_string())),
        }
    }
}
