//! RPC envelopes and error codes.
//!
//! Each established channel carries requests in one direction and responses in
//! the other; requests are matched to responses by a channel-scoped sequence
//! number.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation, unique per channel.
    pub id: u64,
    /// Method name (e.g., `plugin_commands`, `host_set_status`).
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// An RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this responds to.
    pub id: u64,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl Response {
    /// Creates a success response.
    pub fn success(id: u64, result: impl Serialize) -> Self {
        Self {
            id,
            result: Some(serde_json::to_value(result).unwrap_or(Value::Null)),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorResponse {
                code,
                message: message.into(),
            }),
        }
    }
}

/// An RPC error carried in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code, see the constants in this module.
    pub code: i32,
    /// Error message.
    pub message: String,
}

/// Either direction of RPC traffic on a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RpcMessage {
    /// A call from the channel's client side.
    Request(Request),
    /// A reply from the channel's server side.
    Response(Response),
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Bridge-specific error codes
pub const NOT_FOUND: i32 = -32000;
pub const UNAVAILABLE: i32 = -32003;
pub const UNSUPPORTED: i32 = -32004;
pub const COMMAND_FAILED: i32 = -32005;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_error() {
        let resp = Response::success(1, "ok");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"id":1,"result":"ok"}"#);
    }

    #[test]
    fn error_response_omits_result() {
        let resp = Response::error(2, METHOD_NOT_FOUND, "no such method");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""code":-32601"#));
        assert!(!json.contains("result"));
    }

    #[test]
    fn rpc_message_round_trips_through_value() {
        let msg = RpcMessage::Request(Request {
            id: 9,
            method: "plugin_name".to_string(),
            params: Value::Null,
        });
        let value = serde_json::to_value(&msg).unwrap();
        match serde_json::from_value::<RpcMessage>(value).unwrap() {
            RpcMessage::Request(req) => {
                assert_eq!(req.id, 9);
                assert_eq!(req.method, "plugin_name");
            }
            RpcMessage::Response(_) => panic!("expected request"),
        }
    }
}
