//! The plugin-side call server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use quill_mux::{parse_params, to_json, Broker, RpcError, Service};
use quill_proto::messages::{
    methods, CompletionsParams, ExecuteCommandParams, InitializeParams,
};

use crate::host_proxy::RemoteHost;
use crate::traits::{Host, Plugin};

/// Serves the plugin's capability interface on the primary channel.
///
/// Every handler is a forwarding shim to the in-process plugin, with one
/// exception: `plugin_initialize` first dials the host-announced callback
/// channel and wraps it as the [`Host`] proxy the plugin will call back
/// through. Handlers never block the dispatch loop — the RPC server runs
/// each one on its own task — which is what allows `initialize` to issue
/// calls while the host is still awaiting its reply.
pub struct PluginServer {
    plugin: Arc<dyn Plugin>,
    broker: Broker,
}

impl PluginServer {
    /// Creates a server for one plugin instance over one broker.
    #[must_use]
    pub fn new(plugin: Arc<dyn Plugin>, broker: Broker) -> Self {
        Self { plugin, broker }
    }

    async fn initialize(&self, params: Value) -> Result<Value, RpcError> {
        let params: InitializeParams = parse_params(params)?;
        tracing::debug!(
            channel = params.callback_channel,
            "dialing host callback channel"
        );
        let channel = self
            .broker
            .dial(params.callback_channel)
            .await
            .map_err(|e| RpcError::Internal(format!("callback channel dial failed: {e}")))?;
        let host: Arc<dyn Host> = Arc::new(RemoteHost::new(channel));

        self.plugin
            .initialize(host)
            .await
            .map_err(|e| RpcError::Internal(format!("plugin initialization failed: {e}")))?;
        tracing::info!("plugin initialized");
        Ok(Value::Null)
    }

    async fn execute_command(&self, params: Value) -> Result<Value, RpcError> {
        let params: ExecuteCommandParams = parse_params(params)?;
        if !self.plugin.supports_command_execution() {
            return Err(RpcError::Unsupported(
                "plugin does not support command execution".to_string(),
            ));
        }
        self.plugin
            .execute_command(&params.name, params.args)
            .await
            .map_err(|e| RpcError::Command(e.to_string()))?;
        Ok(Value::Null)
    }
}

#[async_trait]
impl Service for PluginServer {
    async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            methods::PLUGIN_NAME => to_json(self.plugin.name().await),
            methods::PLUGIN_VERSION => to_json(self.plugin.version().await),
            methods::PLUGIN_DESCRIPTION => to_json(self.plugin.description().await),
            methods::PLUGIN_INITIALIZE => self.initialize(params).await,
            methods::PLUGIN_CLEANUP => {
                self.plugin
                    .cleanup()
                    .await
                    .map_err(|e| RpcError::Internal(e.to_string()))?;
                Ok(Value::Null)
            }
            methods::PLUGIN_COMMANDS => to_json(self.plugin.commands().await),
            methods::PLUGIN_MAJOR_MODES => to_json(self.plugin.major_modes().await),
            methods::PLUGIN_MINOR_MODES => to_json(self.plugin.minor_modes().await),
            methods::PLUGIN_KEY_BINDINGS => to_json(self.plugin.key_bindings().await),
            methods::PLUGIN_EXECUTE_COMMAND => self.execute_command(params).await,
            methods::PLUGIN_COMPLETIONS => {
                let params: CompletionsParams = parse_params(params)?;
                to_json(
                    self.plugin
                        .completions(&params.command, &params.prefix)
                        .await,
                )
            }
            _ => Err(RpcError::MethodNotFound(method.to_string())),
        }
    }
}
