//! MCP server implementation using rmcp.
//!
//! `ToolServer` adapts a [`Dispatcher`] to rmcp's `ServerHandler`. rmcp owns
//! the framing; this module only hands parsed requests to the dispatcher and
//! returns its responses.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rmcp::service::ServiceExt;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{NotificationContext, RequestContext, RoleServer},
};
use tracing::info;

use crate::tools::{Dispatcher, InvocationRequest, ToolRegistry};

/// MCP server exposing one suite of tools.
#[derive(Clone)]
pub struct ToolServer {
    dispatcher: Dispatcher,
    instructions: Arc<str>,
}

impl ToolServer {
    pub fn new(dispatcher: Dispatcher, instructions: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            instructions: instructions.into(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }
}

impl ServerHandler for ToolServer {
    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), McpError>> + Send + '_ {
        std::future::ready(Ok(()))
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.dispatcher.list_tools(),
            next_cursor: None,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let invocation =
            InvocationRequest::new(request.name.to_string(), request.arguments.unwrap_or_default());
        let dispatcher = self.dispatcher.clone();

        // Failures are already lowered into the response; never an Err here.
        async move {
            let result: CallToolResult = dispatcher.dispatch(invocation).await.into();
            Ok(result)
        }
    }

    fn on_initialized(
        &self,
        _context: NotificationContext<RoleServer>,
    ) -> impl Future<Output = ()> + Send + '_ {
        info!(tools = self.tool_registry().len(), "MCP client initialized");
        std::future::ready(())
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(self.instructions.to_string()),
        }
    }
}

/// Serve `server` over stdin/stdout until the client disconnects or the
/// process receives Ctrl-C.
pub async fn serve_stdio(server: ToolServer) -> Result<()> {
    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

    tokio::select! {
        result = service.waiting() => {
            result?;
            info!("MCP stdio session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down MCP stdio server");
        }
    }
    Ok(())
}

/// Serve `server` as an MCP Streamable HTTP endpoint at `/mcp`, with a
/// `/health` probe, until Ctrl-C.
pub async fn start_mcp_http(server: ToolServer, bind: &str) -> Result<()> {
    let registry = server.tool_registry().clone();

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new()
        .nest_service("/mcp", service)
        .merge(crate::api::create_health_router(registry));
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("MCP HTTP server listening on http://{}/mcp", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl-C, shutting down MCP HTTP server");
        })
        .await?;

    Ok(())
}
