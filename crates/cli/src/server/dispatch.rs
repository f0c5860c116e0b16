//! Request dispatch: JSON-RPC method → session operation.

use std::path::Path;

use dataprobe_engine::{EngineError, SharedSession};
use dataprobe_protocol::{
    parse_params, ExploreDataArgs, LoadDatasetArgs, Method, Operation, PromptGetParams, PromptId, ProtocolError,
    Request, ResourceId, ResourceReadParams, Response, RpcError, RunScriptArgs, ToolCallParams, ToolResult,
    MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use serde_json::{json, Value};

use super::prompt;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    session: SharedSession,
}

impl Dispatcher {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// Handle one raw line. Returns the serialized response, or `None` for
    /// notifications and blank lines.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request)?,
            Err(e) => {
                log::debug!("Malformed request: {}", e);
                Response::failure(Value::Null, ProtocolError::Parse(e.to_string()).into())
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    pub fn handle(&self, request: Request) -> Option<Response> {
        let id = request.id_or_null();
        let notification = request.is_notification();
        log::debug!("{} {}", request.method, id);

        let result = self.call(&request.method, request.params);
        if notification {
            // Notifications (no id) get no response
            if let Err(e) = result {
                log::debug!("Notification {} failed: {}", request.method, e.message);
            }
            return None;
        }

        Some(match result {
            Ok(value) => Response::success(id, value),
            Err(error) => Response::failure(id, error),
        })
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method.parse::<Method>()? {
            Method::Initialize => Ok(json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {"tools": {}, "resources": {}, "prompts": {}},
                "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
            })),
            Method::Initialized => Ok(Value::Null),
            Method::Ping => Ok(json!({})),

            Method::ToolsList => {
                let tools: Vec<Value> = Operation::ALL.iter().map(Operation::descriptor).collect();
                Ok(json!({ "tools": tools }))
            }
            Method::ToolsCall => {
                let call: ToolCallParams = parse_params(params)?;
                let text = self.call_tool(&call.name, call.arguments)?;
                serde_json::to_value(ToolResult::text(text)).map_err(|e| RpcError::internal(e.to_string()))
            }

            Method::ResourcesList => {
                let resources: Vec<Value> = ResourceId::ALL.iter().map(ResourceId::descriptor).collect();
                Ok(json!({ "resources": resources }))
            }
            Method::ResourcesRead => {
                let read: ResourceReadParams = parse_params(params)?;
                let resource: ResourceId = read.uri.parse()?;
                let text = match resource {
                    ResourceId::Notes => self.session.notes(),
                };
                Ok(json!({
                    "contents": [{"uri": resource.uri(), "mimeType": resource.mime_type(), "text": text}]
                }))
            }

            Method::PromptsList => {
                let prompts: Vec<Value> = PromptId::ALL.iter().map(PromptId::descriptor).collect();
                Ok(json!({ "prompts": prompts }))
            }
            Method::PromptsGet => {
                let get: PromptGetParams = parse_params(params)?;
                match get.name.parse::<PromptId>()? {
                    PromptId::ExploreData => {
                        let args: ExploreDataArgs = parse_params(json!(get.arguments))?;
                        Ok(json!({
                            "description": "Data exploration template",
                            "messages": [{
                                "role": "user",
                                "content": {"type": "text", "text": prompt::explore_data(&args.csv_path, &args.topic)}
                            }]
                        }))
                    }
                }
            }
        }
    }

    fn call_tool(&self, name: &str, arguments: Value) -> Result<String, RpcError> {
        match name.parse::<Operation>()? {
            Operation::LoadDataset => {
                let args: LoadDatasetArgs = parse_params(arguments)?;
                self.session
                    .load_dataset(Path::new(&args.csv_path), args.df_name.as_deref())
                    .map_err(engine_error)
            }
            Operation::RunScript => {
                let args: RunScriptArgs = parse_params(arguments)?;
                self.session
                    .run_script(&args.script, args.save_to_memory.as_deref())
                    .map_err(engine_error)
            }
        }
    }
}

fn engine_error(err: EngineError) -> RpcError {
    RpcError::internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataprobe_protocol::codes;
    use std::fs;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(SharedSession::new())
    }

    fn call(d: &Dispatcher, method: &str, params: Value) -> Response {
        let req = Request { jsonrpc: "2.0".into(), id: Some(json!(7)), method: method.into(), params };
        d.handle(req).unwrap()
    }

    fn tool(d: &Dispatcher, name: &str, arguments: Value) -> Response {
        call(d, "tools/call", json!({"name": name, "arguments": arguments}))
    }

    fn tool_text(resp: &Response) -> &str {
        resp.result.as_ref().unwrap()["content"][0]["text"].as_str().unwrap()
    }

    #[test]
    fn test_initialize() {
        let resp = call(&dispatcher(), "initialize", json!({}));
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "dataprobe");
    }

    #[test]
    fn test_notification_has_no_reply() {
        let d = dispatcher();
        assert!(d.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
        assert!(d.handle_line(r#"{"jsonrpc":"2.0","method":"no/such"}"#).is_none());
        assert!(d.handle_line("   ").is_none());
    }

    #[test]
    fn test_parse_error() {
        let out = dispatcher().handle_line("{not json").unwrap();
        let resp: Response = serde_json::from_str(&out).unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, codes::PARSE_ERROR);
    }

    #[test]
    fn test_unknown_method() {
        let resp = call(&dispatcher(), "tools/remove", json!({}));
        assert_eq!(resp.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_tools_list() {
        let resp = call(&dispatcher(), "tools/list", Value::Null);
        let tools = resp.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], "load_dataset");
        assert_eq!(tools[1]["name"], "run_script");
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["script"]));
    }

    #[test]
    fn test_load_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,b\n1,x\n2,y\n3,z\n").unwrap();
        let d = dispatcher();

        let resp = tool(&d, "load_csv", json!({"csv_path": path.to_str().unwrap()}));
        assert_eq!(tool_text(&resp), "Loaded CSV into 'df_1' (3 rows, 2 cols)");

        let resp = tool(&d, "run_script", json!({"script": "print(df_1.a:sum())"}));
        assert_eq!(tool_text(&resp), "6");
        assert_eq!(resp.result.unwrap()["isError"], json!(false));
    }

    #[test]
    fn test_engine_failures_are_internal_errors() {
        let d = dispatcher();
        let resp = tool(&d, "load_dataset", json!({"csv_path": "/nonexistent/x.csv"}));
        let err = resp.error.unwrap();
        assert_eq!(err.code, codes::INTERNAL_ERROR);
        assert!(err.message.starts_with("Error loading CSV:"));

        let resp = tool(&d, "run_script", json!({"script": "error('boom')"}));
        let err = resp.error.unwrap();
        assert_eq!(err.code, codes::INTERNAL_ERROR);
        assert!(err.message.starts_with("Script error:"));
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_unknown_tool_and_bad_args() {
        let d = dispatcher();
        let resp = tool(&d, "drop_table", json!({}));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_PARAMS);
        let resp = tool(&d, "run_script", json!({"code": "print(1)"}));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_notes_resource() {
        let d = dispatcher();
        tool(&d, "run_script", json!({"script": "print('hi')"}));
        let resp = call(&d, "resources/read", json!({"uri": "dataprobe://notes"}));
        let contents = &resp.result.unwrap()["contents"][0];
        assert_eq!(contents["mimeType"], "text/plain");
        assert_eq!(contents["text"], "Executing script:\nprint('hi')\nScript output: hi");

        let resp = call(&d, "resources/read", json!({"uri": "dataprobe://other"}));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_prompt_get() {
        let d = dispatcher();
        let resp = call(&d, "prompts/get", json!({"name": "explore-data", "arguments": {"csv_path": "s.csv"}}));
        let result = resp.result.unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("<csv_path>\ns.csv\n</csv_path>"));

        let resp = call(&d, "prompts/get", json!({"name": "explore-data", "arguments": {}}));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_PARAMS);
        let resp = call(&d, "prompts/get", json!({"name": "other"}));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_lists() {
        let d = dispatcher();
        let resp = call(&d, "resources/list", Value::Null);
        assert_eq!(resp.result.unwrap()["resources"][0]["uri"], "dataprobe://notes");
        let resp = call(&d, "prompts/list", Value::Null);
        assert_eq!(resp.result.unwrap()["prompts"][0]["name"], "explore-data");
    }
}
