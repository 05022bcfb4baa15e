//! MCP server over streamable HTTP or stdio.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use rag_core::{RagError, Result, ServerConfig};

use crate::context::AppContext;
use crate::registry::{result_texts, ToolDescriptor, ToolRegistry};
use crate::tools::build_registry;

/// Path the streamable HTTP transport is mounted under.
pub const MCP_PATH: &str = "/mcp";

const INSTRUCTIONS: &str = "\
Tools:\n\
1) machine_learning_faq_retrieval_tool - answers machine learning questions \
from a curated FAQ (query: string).\n\
2) web_search_tool - searches the web for general or non machine learning \
questions (query: string, num_results: integer, default 10).\n\
Prefer the FAQ tool for machine learning topics and fall back to web search \
when it has nothing relevant.";

/// MCP handler dispatching tool calls through the registry.
#[derive(Clone)]
pub struct RagMcpServer {
    context: Arc<AppContext>,
    registry: Arc<ToolRegistry>,
}

impl RagMcpServer {
    /// Create a server exposing the FAQ retrieval and web search tools.
    pub fn new(context: Arc<AppContext>) -> Result<Self> {
        let registry = build_registry(&context)?;
        Ok(Self {
            context,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Tool listing with input and output schemas.
    pub fn tools(&self) -> Vec<McpTool> {
        self.registry.descriptors().into_iter().map(to_mcp_tool).collect()
    }

    /// Run a tool and shape the outcome as an MCP result.
    ///
    /// Argument and unknown-tool errors become JSON-RPC invalid-params
    /// errors; every other failure is returned as an error result so the
    /// session stays usable.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, McpError> {
        match self.registry.call(name, arguments).await {
            Ok(value) => {
                let content = result_texts(&value).into_iter().map(Content::text).collect();
                let mut result = CallToolResult::success(content);
                result.structured_content = Some(json!({ "result": value }));
                Ok(result)
            }
            Err(e) if e.is_caller_error() => {
                warn!("Rejected call to {}: {}", name, e);
                Err(McpError::invalid_params(e.to_string(), None))
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "[{}] {}",
                    e.error_code(),
                    e
                ))]))
            }
        }
    }
}

fn to_mcp_tool(descriptor: &ToolDescriptor) -> McpTool {
    let mut tool = McpTool::new(
        descriptor.name,
        descriptor.description,
        Arc::new(descriptor.input_schema.clone()),
    );
    tool.output_schema = Some(Arc::new(descriptor.output_schema.clone()));
    tool
}

impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = Implementation::from_build_env();
        implementation.name = self.context.config.server.name.clone();
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: implementation,
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(&request.name, request.arguments).await }
    }
}

/// Serve MCP over streamable HTTP on `listener` until `shutdown` resolves.
pub async fn serve_http<F>(
    server: RagMcpServer,
    listener: TcpListener,
    stateful: bool,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = StreamableHttpServerConfig {
        stateful_mode: stateful,
        ..Default::default()
    };

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        config,
    );

    let app = Router::new().nest_service(MCP_PATH, service);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("MCP HTTP server stopped");
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_http(server: RagMcpServer, config: &ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;

    info!(
        "Serving MCP on http://{}{} (stateful sessions: {})",
        listener.local_addr()?,
        MCP_PATH,
        config.stateful_sessions
    );

    serve_http(server, listener, config.stateful_sessions, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    })
    .await
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: RagMcpServer) -> Result<()> {
    info!("Serving MCP on stdio");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| RagError::internal(format!("Failed to start stdio server: {}", e)))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| RagError::internal(format!("Stdio server task failed: {}", e)))?;

    info!("Stdio session ended: {:?}", reason);
    Ok(())
}
