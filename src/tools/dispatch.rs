//! Routes an invocation to its handler and lowers every outcome into a
//! [`ToolResponse`].
//!
//! Per request the dispatcher goes through routing, validation, invocation
//! and rendering. Unknown tools and invalid arguments are answered here and
//! never reach a handler. Handler failures, and panics inside a handler, are
//! turned into failure responses; nothing a single invocation does can take
//! the transport down with it.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use rmcp::model::{JsonObject, Tool as McpTool};
use serde_json::json;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::tools::envelope::{ContentBlock, HandlerFailure, ToolOutput, ToolResponse};
use crate::tools::registry::ToolRegistry;
use crate::tools::schema::ValidationError;

/// One request to execute a named tool.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: JsonObject,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Every way an invocation can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Unsupported tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    Validation {
        tool: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Handler(#[from] HandlerFailure),

    #[error("Unexpected fault in {tool}: {message}")]
    UnexpectedFault { tool: String, message: String },
}

/// Turns a failure into the text of the single block of a failure response.
pub type FailureRenderer = fn(&ToolError) -> String;

/// Plain-language message, e.g. `Unsupported tool: foo`.
pub fn render_plain(err: &ToolError) -> String {
    err.to_string()
}

/// `{"error": "<message>"}`, for clients that parse tool output as JSON.
pub fn render_json(err: &ToolError) -> String {
    json!({ "error": err.to_string() }).to_string()
}

/// Lower a handler's successful payload into content blocks.
pub fn render_output(output: ToolOutput) -> ToolResponse {
    let text = match output {
        ToolOutput::Text(text) => text,
        ToolOutput::Json { heading, value } => {
            let body = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            match heading {
                Some(heading) => format!("{} {}", heading, body),
                None => body,
            }
        }
        ToolOutput::Empty { message } => message,
    };
    ToolResponse::success(vec![ContentBlock::text(text)])
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn fault_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        "handler task was cancelled".to_string()
    }
}

/// Sole boundary between the transport and tool handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    render_failure: FailureRenderer,
}

impl Dispatcher {
    /// Dispatcher rendering failures as plain text.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            render_failure: render_plain,
        }
    }

    pub fn with_failure_renderer(mut self, render_failure: FailureRenderer) -> Self {
        self.render_failure = render_failure;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Descriptors for a discovery request, in registration order.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.registry.list_tools()
    }

    /// Process one request to completion. Always yields a response.
    pub async fn dispatch(&self, request: InvocationRequest) -> ToolResponse {
        let started = Instant::now();
        let tool_name = request.tool_name.clone();
        debug!(tool = %tool_name, "Dispatching tool call");

        match self.invoke(request).await {
            Ok(output) => {
                debug!(
                    tool = %tool_name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                render_output(output)
            }
            Err(err) => {
                match &err {
                    ToolError::UnexpectedFault { .. } => error!(tool = %tool_name, "{}", err),
                    _ => warn!(tool = %tool_name, "{}", err),
                }
                ToolResponse::failure((self.render_failure)(&err))
            }
        }
    }

    async fn invoke(&self, request: InvocationRequest) -> Result<ToolOutput, ToolError> {
        let InvocationRequest {
            tool_name,
            arguments,
        } = request;

        let tool = self
            .registry
            .resolve(&tool_name)
            .map_err(|_| ToolError::UnknownTool(tool_name.clone()))?;

        let args = tool
            .descriptor()
            .input_schema
            .validate(&arguments)
            .map_err(|source| ToolError::Validation {
                tool: tool_name.clone(),
                source,
            })?;

        // The handler runs on its own task so a panic surfaces as a JoinError
        // instead of unwinding through the transport.
        let handler = tool.handler().clone();
        let task = tokio::spawn(async move { handler.execute(args).await });

        match task.await {
            Ok(outcome) => outcome.map_err(ToolError::Handler),
            Err(join_err) => Err(ToolError::UnexpectedFault {
                tool: tool_name,
                message: fault_message(join_err),
            }),
        }
    }
}
