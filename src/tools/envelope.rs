//! Response envelope shared by every tool.
//!
//! Handlers produce a [`HandlerOutcome`]; the dispatcher lowers it, or any
//! failure on the way to it, into a [`ToolResponse`], which is what goes back
//! over the transport.

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

/// Atomic unit of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Uniform success-or-failure envelope returned for every invocation.
///
/// Always carries at least one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    content: Vec<ContentBlock>,
    is_error: bool,
}

impl ToolResponse {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self::build(content, false)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::build(vec![ContentBlock::text(message)], true)
    }

    fn build(mut content: Vec<ContentBlock>, is_error: bool) -> Self {
        if content.is_empty() {
            content.push(ContentBlock::text(""));
        }
        Self { content, is_error }
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text { text } => Content::text(text),
            })
            .collect();
        CallToolResult {
            content,
            structured_content: None,
            is_error: Some(response.is_error),
            meta: None,
        }
    }
}

/// Successful payload of a handler, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text, emitted as-is.
    Text(String),
    /// A JSON document, pretty-printed after an optional heading.
    Json { heading: Option<String>, value: Value },
    /// A read that matched nothing. Still a success.
    Empty { message: String },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn json(heading: impl Into<String>, value: Value) -> Self {
        Self::Json {
            heading: Some(heading.into()),
            value,
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::Empty {
            message: message.into(),
        }
    }
}

/// Expected failure reported by a handler, e.g. a refused connection or a
/// non-success HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {message}")]
pub struct HandlerFailure {
    context: String,
    message: String,
}

impl HandlerFailure {
    pub fn new(context: impl Into<String>, message: impl ToString) -> Self {
        Self {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type HandlerOutcome = Result<ToolOutput, HandlerFailure>;
