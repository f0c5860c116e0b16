//! dataprobe wire protocol
//!
//! Requests and responses are JSON-RPC 2.0 objects, one per line, over
//! stdio or a TCP socket. The method set follows the Model Context
//! Protocol: tools for loading data and running scripts, one notes
//! resource and one prompt.
//!
//! # Usage
//!
//! ```ignore
//! use dataprobe_protocol::{Request, Response, Method};
//!
//! let req: Request = serde_json::from_str(&line)?;
//! let method: Method = req.method.parse()?;
//! let resp = Response::success(req.id_or_null(), serde_json::json!({}));
//! writeln!(out, "{}", serde_json::to_string(&resp)?)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP revision advertised in `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "dataprobe";

/// JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

// =============================================================================
// Envelope
// =============================================================================

/// Incoming request or notification (no `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn id_or_null(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// Outgoing response. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Engine failure surfaced to the client.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Request-level failures, each with a JSON-RPC code.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    Parse(String),
    InvalidRequest(String),
    MethodNotFound(String),
    UnknownOperation(String),
    UnknownResource(String),
    UnknownPrompt(String),
    InvalidParams(String),
}

impl ProtocolError {
    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => codes::PARSE_ERROR,
            Self::InvalidRequest(_) => codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Self::UnknownOperation(_) | Self::UnknownResource(_) | Self::UnknownPrompt(_) | Self::InvalidParams(_) => {
                codes::INVALID_PARAMS
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            Self::MethodNotFound(m) => write!(f, "Method not found: {m}"),
            Self::UnknownOperation(name) => write!(f, "Unknown tool: {name}"),
            Self::UnknownResource(uri) => write!(f, "Unknown resource: {uri}"),
            Self::UnknownPrompt(name) => write!(f, "Unknown prompt: {name}"),
            Self::InvalidParams(msg) => write!(f, "Invalid params: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ProtocolError> for RpcError {
    fn from(err: ProtocolError) -> Self {
        RpcError::new(err.code(), err.to_string())
    }
}

/// Deserialize `params` or `arguments` into a typed struct.
pub fn parse_params<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidParams(e.to_string()))
}

// =============================================================================
// Methods
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Initialize => "initialize",
            Method::Initialized => "notifications/initialized",
            Method::Ping => "ping",
            Method::ToolsList => "tools/list",
            Method::ToolsCall => "tools/call",
            Method::ResourcesList => "resources/list",
            Method::ResourcesRead => "resources/read",
            Method::PromptsList => "prompts/list",
            Method::PromptsGet => "prompts/get",
        }
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "initialize" => Method::Initialize,
            "notifications/initialized" | "initialized" => Method::Initialized,
            "ping" => Method::Ping,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            "resources/list" => Method::ResourcesList,
            "resources/read" => Method::ResourcesRead,
            "prompts/list" => Method::PromptsList,
            "prompts/get" => Method::PromptsGet,
            other => return Err(ProtocolError::MethodNotFound(other.to_string())),
        })
    }
}

// =============================================================================
// Operations (tools)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadDataset,
    RunScript,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::LoadDataset, Operation::RunScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::LoadDataset => "load_dataset",
            Operation::RunScript => "run_script",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::LoadDataset => {
                "Load a CSV file into a named dataset. Without df_name the dataset is called df_<n>."
            }
            Operation::RunScript => {
                "Run a Lua script against the loaded datasets. Datasets are globals; pd, np, stats, \
                 sm and ml are available. Printed output is returned. Names listed in save_to_memory \
                 that hold a DataFrame are kept for later scripts."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            Operation::LoadDataset => json!({
                "type": "object",
                "properties": {
                    "csv_path": {"type": "string", "description": "Path to the CSV file"},
                    "df_name": {"type": "string", "description": "Name for the dataset"}
                },
                "required": ["csv_path"]
            }),
            Operation::RunScript => json!({
                "type": "object",
                "properties": {
                    "script": {"type": "string", "description": "Lua source to execute"},
                    "save_to_memory": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Script globals to persist as datasets"
                    }
                },
                "required": ["script"]
            }),
        }
    }

    /// Entry for `tools/list`.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.as_str(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load_dataset" | "load_csv" => Ok(Operation::LoadDataset),
            "run_script" => Ok(Operation::RunScript),
            other => Err(ProtocolError::UnknownOperation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDatasetArgs {
    pub csv_path: String,
    #[serde(default)]
    pub df_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunScriptArgs {
    pub script: String,
    #[serde(default)]
    pub save_to_memory: Option<Vec<String>>,
}

/// `tools/call` result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![TextContent::new(text)], is_error: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { kind: "text".to_string(), text: text.into() }
    }
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId {
    Notes,
}

impl ResourceId {
    pub const ALL: [ResourceId; 1] = [ResourceId::Notes];

    pub fn uri(&self) -> &'static str {
        match self {
            ResourceId::Notes => "dataprobe://notes",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        "text/plain"
    }

    /// Entry for `resources/list`.
    pub fn descriptor(&self) -> Value {
        match self {
            ResourceId::Notes => json!({
                "uri": self.uri(),
                "name": "Data Exploration Notes",
                "description": "Activity log of loads, scripts, outputs and saved datasets",
                "mimeType": self.mime_type(),
            }),
        }
    }
}

impl FromStr for ResourceId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dataprobe://notes" => Ok(ResourceId::Notes),
            other => Err(ProtocolError::UnknownResource(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReadParams {
    pub uri: String,
}

// =============================================================================
// Prompts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptId {
    ExploreData,
}

impl PromptId {
    pub const ALL: [PromptId; 1] = [PromptId::ExploreData];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptId::ExploreData => "explore-data",
        }
    }

    /// Entry for `prompts/list`.
    pub fn descriptor(&self) -> Value {
        match self {
            PromptId::ExploreData => json!({
                "name": self.as_str(),
                "description": "A prompt to explore a CSV dataset as a data scientist",
                "arguments": [
                    {"name": "csv_path", "description": "Path to the CSV file", "required": true},
                    {"name": "topic", "description": "Topic the exploration should focus on", "required": false}
                ]
            }),
        }
    }
}

impl FromStr for PromptId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explore-data" => Ok(PromptId::ExploreData),
            other => Err(ProtocolError::UnknownPrompt(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptGetParams {
    pub name: String,
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreDataArgs {
    pub csv_path: String,
    #[serde(default)]
    pub topic: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_notification() {
        let req: Request = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(req.is_notification());
        assert_eq!(req.method.parse::<Method>().unwrap(), Method::Initialized);
        assert_eq!(req.id_or_null(), Value::Null);
    }

    #[test]
    fn test_unknown_method() {
        let err = "tools/delete".parse::<Method>().unwrap_err();
        assert_eq!(err.code(), codes::METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "Method not found: tools/delete");
    }

    #[test]
    fn test_operation_alias() {
        assert_eq!("load_csv".parse::<Operation>().unwrap(), Operation::LoadDataset);
        assert_eq!("load_dataset".parse::<Operation>().unwrap(), Operation::LoadDataset);
        let err = "drop_table".parse::<Operation>().unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }

    #[test]
    fn test_load_args_optional_name() {
        let args: LoadDatasetArgs = parse_params(json!({"csv_path": "a.csv"})).unwrap();
        assert_eq!(args.df_name, None);
        let err = parse_params::<LoadDatasetArgs>(json!({"df_name": "x"})).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams(_)));
    }

    #[test]
    fn test_run_args_null_params() {
        let err = parse_params::<RunScriptArgs>(Value::Null).unwrap_err();
        assert!(err.to_string().contains("script"));
        let args: RunScriptArgs = parse_params(json!({"script": "print(1)", "save_to_memory": ["a"]})).unwrap();
        assert_eq!(args.save_to_memory, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_response_wire_shape() {
        let ok = Response::success(json!(1), serde_json::to_value(ToolResult::text("hi")).unwrap());
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"content": [{"type": "text", "text": "hi"}], "isError": false}
            })
        );

        let err = Response::failure(json!("a"), RpcError::internal("Script error: boom"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"jsonrpc": "2.0", "id": "a", "error": {"code": -32603, "message": "Script error: boom"}})
        );
    }

    #[test]
    fn test_resource_and_prompt_ids() {
        assert_eq!("dataprobe://notes".parse::<ResourceId>().unwrap(), ResourceId::Notes);
        assert!("dataprobe://other".parse::<ResourceId>().is_err());
        assert_eq!(PromptId::ExploreData.descriptor()["arguments"][0]["required"], json!(true));
    }

    #[test]
    fn test_explore_args_default_topic() {
        let args: ExploreDataArgs = parse_params(json!({"csv_path": "d.csv"})).unwrap();
        assert_eq!(args.topic, "");
    }
}
