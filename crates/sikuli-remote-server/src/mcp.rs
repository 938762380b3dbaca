//! MCP surface over the keyword dispatcher
//!
//! Exposes the four remote library calls as MCP tools over stdio. Report
//! lines are never echoed in this mode: stdout belongs to the transport.

use crate::dispatch::RemoteDispatchServer;
use rmcp::{
    ServerHandler, schemars,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Request for get_keyword_documentation and get_keyword_arguments
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct KeywordNameRequest {
    #[schemars(description = "Keyword name; case, spaces and underscores are ignored")]
    pub name: String,
}

/// Request for run_keyword
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunKeywordRequest {
    #[schemars(description = "Keyword name, e.g. 'Click' or 'wait_until_screen_contain'")]
    pub name: String,
    #[schemars(description = "Positional arguments; strings are coerced to the declared types")]
    #[serde(default)]
    pub args: Vec<Value>,
    #[schemars(description = "Named arguments")]
    #[serde(default)]
    pub kwargs: Option<Map<String, Value>>,
}

fn error_response(error_type: &str, message: impl Into<String>) -> String {
    json!({
        "error": error_type,
        "message": message.into()
    })
    .to_string()
}

#[derive(Clone)]
pub struct KeywordMcpServer {
    dispatch: Arc<RemoteDispatchServer>,
    tool_router: ToolRouter<Self>,
}

impl KeywordMcpServer {
    pub fn new(dispatch: Arc<RemoteDispatchServer>) -> Self {
        let tool_router = Self::tool_router();
        Self {
            dispatch,
            tool_router,
        }
    }
}

#[tool_router]
impl KeywordMcpServer {
    #[tool(description = "List every keyword the server provides")]
    async fn get_keyword_names(&self) -> String {
        json!(self.dispatch.list_operations()).to_string()
    }

    #[tool(description = "Get the documentation of a keyword")]
    async fn get_keyword_documentation(
        &self,
        Parameters(req): Parameters<KeywordNameRequest>,
    ) -> String {
        match self.dispatch.describe(&req.name) {
            Ok(documentation) => json!({ "documentation": documentation }).to_string(),
            Err(e) => error_response(e.kind(), e.to_string()),
        }
    }

    #[tool(description = "Get the argument specification of a keyword")]
    async fn get_keyword_arguments(
        &self,
        Parameters(req): Parameters<KeywordNameRequest>,
    ) -> String {
        match self.dispatch.parameters(&req.name) {
            Ok(arguments) => json!({ "arguments": arguments }).to_string(),
            Err(e) => error_response(e.kind(), e.to_string()),
        }
    }

    #[tool(
        description = "Run a keyword and return its result with status, return value, report output and error details"
    )]
    async fn run_keyword(&self, Parameters(req): Parameters<RunKeywordRequest>) -> String {
        let result = self
            .dispatch
            .invoke(&req.name, &req.args, req.kwargs.as_ref())
            .await;
        serde_json::to_string(&result)
            .unwrap_or_else(|e| error_response("serialization_error", e.to_string()))
    }
}

#[tool_handler]
impl ServerHandler for KeywordMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Visual UI automation keywords. Use 'get_keyword_names' to discover keywords, \
                 'get_keyword_documentation' and 'get_keyword_arguments' to learn how to call \
                 them, and 'run_keyword' to run one."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::virtual_screen;
    use crate::keywords::test_support::dispatcher;
    use sikuli_remote_engine::Placement;
    use sikuli_remote_protocol::Rect;

    async fn server() -> (KeywordMcpServer, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("ok.png", Rect::new(0, 0, 10, 10)));
        let dispatch = dispatcher(screen, tmp.path()).await;
        (KeywordMcpServer::new(Arc::new(dispatch)), tmp)
    }

    #[tokio::test]
    async fn test_tools_mirror_remote_calls() {
        let (server, _tmp) = server().await;

        let names: Vec<String> = serde_json::from_str(&server.get_keyword_names().await).unwrap();
        assert!(names.contains(&"double_click".to_string()));

        let docs = server
            .get_keyword_documentation(Parameters(KeywordNameRequest {
                name: "Double Click".to_string(),
            }))
            .await;
        let docs: Value = serde_json::from_str(&docs).unwrap();
        assert!(!docs["documentation"].as_str().unwrap().is_empty());

        let missing = server
            .get_keyword_arguments(Parameters(KeywordNameRequest {
                name: "nope".to_string(),
            }))
            .await;
        let missing: Value = serde_json::from_str(&missing).unwrap();
        assert_eq!(missing["error"], json!("NoSuchKeywordError"));
    }

    #[tokio::test]
    async fn test_run_keyword_returns_remote_result() {
        let (server, _tmp) = server().await;

        let result = server
            .run_keyword(Parameters(RunKeywordRequest {
                name: "exists".to_string(),
                args: vec![json!("ok.png")],
                kwargs: None,
            }))
            .await;
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["status"], json!("PASS"));
        assert_eq!(result["return"], json!(true));
    }
}
