//! The host-side plugin client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use quill_mux::{Broker, Channel, RpcClient, RpcError};
use quill_proto::messages::{
    methods, CompletionsParams, ExecuteCommandParams, InitializeParams,
};
use quill_proto::{rpc, CommandSpec, KeyBindingSpec, MajorModeSpec, MinorModeSpec};
use quill_sdk::{Host, Plugin, PluginError};

use crate::host_server::HostServer;

/// [`Plugin`] implementation that forwards every call to a plugin process
/// over the primary channel.
///
/// Metadata getters degrade on transport failure: a dead bridge yields empty
/// strings and empty lists, with the failure logged, so the editor can list
/// a wedged plugin without erroring on every query. Calls with semantics the
/// caller must see — `initialize`, `cleanup`, `execute_command` — surface
/// their failures as [`PluginError`].
pub struct PluginClient {
    rpc: RpcClient,
    broker: Broker,
}

impl PluginClient {
    /// Wraps the primary channel of an established bridge.
    #[must_use]
    pub fn new(broker: Broker, primary: Channel) -> Self {
        Self {
            rpc: RpcClient::new(primary),
            broker,
        }
    }

    /// One metadata call decoded into its default on any failure.
    async fn query<T>(&self, method: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let value = match self.rpc.call(method, Value::Null).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(method, error = %e, "plugin call failed");
                return T::default();
            }
        };
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(method, error = %e, "malformed plugin reply");
            T::default()
        })
    }

    async fn unit_call(&self, method: &str, params: Value) -> Result<(), PluginError> {
        self.rpc.call(method, params).await.map_err(plugin_err)?;
        Ok(())
    }
}

fn plugin_err(e: RpcError) -> PluginError {
    match e {
        RpcError::Remote {
            code: rpc::UNSUPPORTED,
            ..
        } => PluginError::UnsupportedExecution,
        RpcError::Remote { message, .. } => PluginError::Message(message),
        other => PluginError::Rpc(other.to_string()),
    }
}

fn params_of<T: serde::Serialize>(params: T) -> Value {
    serde_json::to_value(params).unwrap_or(Value::Null)
}

#[async_trait]
impl Plugin for PluginClient {
    async fn name(&self) -> String {
        self.query(methods::PLUGIN_NAME).await
    }

    async fn version(&self) -> String {
        self.query(methods::PLUGIN_VERSION).await
    }

    async fn description(&self) -> String {
        self.query(methods::PLUGIN_DESCRIPTION).await
    }

    /// Runs the channel-establishment protocol, then the plugin's own
    /// initialization.
    ///
    /// The callback channel id is allocated and registered *before* the
    /// `plugin_initialize` call goes out, so the plugin's dial can never race
    /// ahead of the listener. The accept side is served on its own task: the
    /// plugin is allowed to call back into `host` while `initialize` is still
    /// in flight, and that task keeps serving host calls for the lifetime of
    /// the bridge. If the initialize call fails the listener is withdrawn.
    async fn initialize(&self, host: Arc<dyn Host>) -> Result<(), PluginError> {
        let id = self.broker.next_id();
        let listener = self
            .broker
            .listen(id)
            .await
            .map_err(|e| PluginError::Rpc(e.to_string()))?;
        tracing::debug!(channel = id, "callback channel registered");

        let server = Arc::new(HostServer::new(host));
        let serve_task = tokio::spawn(async move {
            let channel = match listener.accept().await {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::debug!(error = %e, "callback accept aborted");
                    return;
                }
            };
            if let Err(e) = quill_mux::serve(channel, server).await {
                tracing::warn!(error = %e, "host callback server failed");
            }
        });

        let params = params_of(InitializeParams {
            callback_channel: id,
        });
        if let Err(e) = self.rpc.call(methods::PLUGIN_INITIALIZE, params).await {
            self.broker.unlisten(id);
            serve_task.abort();
            return Err(plugin_err(e));
        }
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), PluginError> {
        self.unit_call(methods::PLUGIN_CLEANUP, Value::Null).await
    }

    async fn commands(&self) -> Vec<CommandSpec> {
        self.query(methods::PLUGIN_COMMANDS).await
    }

    async fn major_modes(&self) -> Vec<MajorModeSpec> {
        self.query(methods::PLUGIN_MAJOR_MODES).await
    }

    async fn minor_modes(&self) -> Vec<MinorModeSpec> {
        self.query(methods::PLUGIN_MINOR_MODES).await
    }

    async fn key_bindings(&self) -> Vec<KeyBindingSpec> {
        self.query(methods::PLUGIN_KEY_BINDINGS).await
    }

    // The probe happens on the plugin side: forwarding is always possible,
    // and a plugin without the capability answers with a clean unsupported
    // error that maps back to `PluginError::UnsupportedExecution`.
    fn supports_command_execution(&self) -> bool {
        true
    }

    async fn execute_command(&self, name: &str, args: Vec<Value>) -> Result<(), PluginError> {
        let params = params_of(ExecuteCommandParams {
            name: name.to_string(),
            args,
        });
        self.unit_call(methods::PLUGIN_EXECUTE_COMMAND, params).await
    }

    async fn completions(&self, command: &str, prefix: &str) -> Vec<String> {
        let value = match self
            .rpc
            .call(
                methods::PLUGIN_COMPLETIONS,
                params_of(CompletionsParams {
                    command: command.to_string(),
                    prefix: prefix.to_string(),
                }),
            )
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "plugin call failed");
                return Vec::new();
            }
        };
        serde_json::from_value(value).unwrap_or_default()
    }
}
