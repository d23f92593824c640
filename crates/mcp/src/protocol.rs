//! JSON-RPC 2.0 envelope and MCP message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Protocol version sent during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Request ID (string or number on the wire).
///
/// Gangway always issues string IDs, but remote servers are free to use
/// numbers for their own traffic, so both shapes decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Outbound JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: impl Serialize) -> Self {
        self.params = Some(serde_json::to_value(params).unwrap_or(Value::Null));
        self
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code;
        let message = &self.message;
        write!(f, "[{code}] {message}")
    }
}

impl std::error::Error for JsonRpcError {}

/// A reply matching one of our outstanding requests.
#[derive(Debug)]
pub struct InboundResponse {
    pub id: RequestId,
    /// Result payload on success, the remote's error object on failure.
    pub outcome: std::result::Result<Value, JsonRpcError>,
}

/// An inbound frame, classified by shape.
#[derive(Debug)]
pub enum Inbound {
    /// Response to a request we issued.
    Response(InboundResponse),
    /// Request initiated by the remote. Gangway is a client only and does
    /// not serve these.
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    /// Fire-and-forget notification.
    Notification {
        method: String,
        params: Option<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Decode one wire frame into its tagged shape.
///
/// A frame with a `method` is a request (with `id`) or notification
/// (without). A frame with an `id` and no `method` is a response; some
/// servers omit `result` for void methods, so a bare `id` decodes as a
/// `null` success rather than an error. Anything else is malformed.
pub fn decode(frame: &str) -> Result<Inbound, Error> {
    let raw: RawMessage =
        serde_json::from_str(frame).map_err(|e| Error::Decode(e.to_string()))?;

    match (raw.method, raw.id) {
        (Some(method), Some(id)) => Ok(Inbound::Request {
            id,
            method,
            params: raw.params,
        }),
        (Some(method), None) => Ok(Inbound::Notification {
            method,
            params: raw.params,
        }),
        (None, Some(id)) => {
            let outcome = match raw.error {
                Some(error) => Err(error),
                None => Ok(raw.result.unwrap_or(Value::Null)),
            };
            Ok(Inbound::Response(InboundResponse { id, outcome }))
        }
        (None, None) => Err(Error::Decode(
            "message has neither method nor id".to_string(),
        )),
    }
}

// --- MCP-specific types ---

/// Params for the `initialize` handshake step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: ClientInfo,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: "gangway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Capabilities advertised during initialization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientCapabilities {
    pub tools: ToolsSupport,
}

/// Marker for tool support; serializes as an empty object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolsSupport {}

/// Client identity sent during initialization.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Tool descriptor advertised by a server via `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments, when the server provides one.
    #[serde(default)]
    pub input_schema: Value,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// Params for `tools/call`.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Result of `tools/call`. The content blocks are opaque to the core.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request() {
        let req = JsonRpcRequest::new("r-1", "initialize").with_params(InitializeParams::default());
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"initialize\""));
        assert!(json.contains("\"protocolVersion\":\"2024-11-05\""));
        assert!(json.contains("\"tools\":{}"));
    }

    #[test]
    fn request_without_params_omits_field() {
        let req = JsonRpcRequest::new("r-2", "tools/list");
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("params"));
    }

    #[test]
    fn decode_success_response() {
        let inbound = decode(r#"{"jsonrpc":"2.0","id":"abc","result":{"ok":true}}"#).unwrap();
        match inbound {
            Inbound::Response(r) => {
                assert_eq!(r.id, RequestId::from("abc"));
                assert_eq!(r.outcome.unwrap()["ok"], true);
            }
            other => panic!("wrong shape: {other:?}"),
        }
    }

    #[test]
    fn decode_error_response() {
        let inbound =
            decode(r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32601,"message":"no such method"}}"#)
                .unwrap();
        match inbound {
            Inbound::Response(r) => {
                assert_eq!(r.id, RequestId::from(7));
                let err = r.outcome.unwrap_err();
                assert_eq!(err.code, -32601);
                assert_eq!(err.to_string(), "[-32601] no such method");
            }
            other => panic!("wrong shape: {other:?}"),
        }
    }

    #[test]
    fn decode_bare_id_is_null_success() {
        let inbound = decode(r#"{"jsonrpc":"2.0","id":"void"}"#).unwrap();
        match inbound {
            Inbound::Response(r) => assert_eq!(r.outcome.unwrap(), Value::Null),
            other => panic!("wrong shape: {other:?}"),
        }
    }

    #[test]
    fn decode_notification() {
        let inbound =
            decode(r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{"n":1}}"#)
                .unwrap();
        match inbound {
            Inbound::Notification { method, params } => {
                assert_eq!(method, "notifications/progress");
                assert_eq!(params.unwrap()["n"], 1);
            }
            other => panic!("wrong shape: {other:?}"),
        }
    }

    #[test]
    fn decode_inbound_request() {
        let inbound = decode(r#"{"jsonrpc":"2.0","id":1,"method":"sampling/createMessage"}"#)
            .unwrap();
        assert!(matches!(inbound, Inbound::Request { .. }));
    }

    #[test]
    fn decode_rejects_shapeless_message() {
        assert!(matches!(
            decode(r#"{"jsonrpc":"2.0"}"#),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(decode("not json"), Err(Error::Decode(_))));
    }

    #[test]
    fn deserialize_tool_without_schema() {
        let tool: Tool = serde_json::from_str(r#"{"name":"search"}"#).unwrap();
        assert_eq!(tool.name, "search");
        assert!(tool.description.is_none());
        assert_eq!(tool.input_schema, Value::Null);
    }

    #[test]
    fn deserialize_tool_list() {
        let json = r#"{
            "tools": [
                {"name": "search", "description": "Web search",
                 "inputSchema": {"type": "object", "properties": {"q": {"type": "string"}}}}
            ]
        }"#;
        let result: ListToolsResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "search");
    }
}
