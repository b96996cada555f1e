//! Tool dispatch layer and the tool implementations.
//!
//! `registry` holds descriptors and handlers, `schema` validates arguments,
//! `dispatch` routes calls and contains failures, and `envelope` defines the
//! response shape every call produces.

mod dispatch;
mod envelope;
mod registry;
mod schema;

pub use dispatch::{
    Dispatcher, FailureRenderer, InvocationRequest, ToolError, render_json, render_output,
    render_plain,
};
pub use envelope::{ContentBlock, HandlerFailure, HandlerOutcome, ToolOutput, ToolResponse};
pub use registry::{
    HandlerFuture, RegisteredTool, RegistryError, ToolDescriptor, ToolHandler, ToolRegistry,
};
pub use schema::{Field, FieldKind, Schema, ValidatedArguments, ValidationError};

// Tool handler implementations
mod crm;
mod slack;
mod upload;

pub use crm::CrmQueryTool;
pub use slack::{DEFAULT_CHANNEL_LIMIT, ListChannelsHandler, PostMessageHandler};
pub use upload::{UploadReportHandler, report_url};
