//! Tool registry.
//!
//! Provides the `ToolHandler` trait for implementing tools and a
//! `ToolRegistry` that keeps descriptors in registration order and resolves
//! handlers by name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::Tool as McpTool;

use crate::tools::envelope::HandlerOutcome;
use crate::tools::schema::{Schema, ValidatedArguments};

/// Boxed future returned by [`ToolHandler::execute`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = HandlerOutcome> + Send + 'a>>;

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unsupported tool: {0}")]
    UnknownTool(String),
}

/// Static metadata for a tool. Never mutated after registration.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub input_schema: Schema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Schema) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema,
        }
    }

    /// Converts this descriptor to an `McpTool` for use in `list_tools`.
    pub fn to_mcp_tool(&self) -> McpTool {
        use std::borrow::Cow;

        McpTool {
            name: Cow::Owned(self.name.clone()),
            title: self.title.clone(),
            description: Some(Cow::Owned(self.description.clone())),
            input_schema: Arc::new(self.input_schema.to_json_schema()),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

/// Trait for handling tool invocations.
///
/// Each tool implements this trait to declare its schema and perform its
/// effect. `execute` only ever sees arguments that passed the schema. Expected
/// failures are returned as `Err(HandlerFailure)`; anything else that goes
/// wrong is contained by the dispatcher.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's name (e.g., "slack_post_message").
    fn name(&self) -> &str;

    /// Returns the tool's human-readable title.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Returns the input schema for this tool.
    fn input_schema(&self) -> Schema;

    /// Executes the tool with validated arguments.
    fn execute(&self, args: ValidatedArguments) -> HandlerFuture<'_>;

    /// Builds the descriptor this handler registers under.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            title: self.title().map(|s| s.to_string()),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// A descriptor paired with the handler that implements it.
#[derive(Clone)]
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

/// Ordered registry of tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `descriptor.name`.
    ///
    /// A second registration under an existing name is rejected and the first
    /// one stays active.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }
        self.by_name.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { descriptor, handler });
        Ok(())
    }

    /// Register a handler under its own descriptor.
    pub fn register_handler<T: ToolHandler + 'static>(&mut self, handler: T) -> Result<(), RegistryError> {
        self.register(handler.descriptor(), Arc::new(handler))
    }

    /// Builder form of [`register_handler`](Self::register_handler).
    pub fn with_handler<T: ToolHandler + 'static>(mut self, handler: T) -> Result<Self, RegistryError> {
        self.register_handler(handler)?;
        Ok(self)
    }

    /// Find the tool registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.tools[idx])
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// All registered tools as `McpTool` instances for `list_tools`.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.tools.iter().map(|t| t.descriptor.to_mcp_tool()).collect()
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::envelope::ToolOutput;

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    impl ToolHandler for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes a fixed reply"
        }

        fn input_schema(&self) -> Schema {
            Schema::new()
        }

        fn execute(&self, _args: ValidatedArguments) -> HandlerFuture<'_> {
            let reply = self.reply;
            Box::pin(async move { Ok(ToolOutput::text(reply)) })
        }
    }

    fn echo(name: &'static str, reply: &'static str) -> EchoTool {
        EchoTool { name, reply }
    }

    #[test]
    fn test_resolve_registered_names() {
        let registry = ToolRegistry::new()
            .with_handler(echo("a", "1"))
            .unwrap()
            .with_handler(echo("b", "2"))
            .unwrap();

        for name in ["a", "b"] {
            assert_eq!(registry.resolve(name).unwrap().descriptor().name, name);
        }
        assert_eq!(
            registry.resolve("").err(),
            Some(RegistryError::UnknownTool(String::new()))
        );
        assert_eq!(
            registry.resolve("nope").err(),
            Some(RegistryError::UnknownTool("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register_handler(echo("dup", "first")).unwrap();

        let err = registry.register_handler(echo("dup", "second")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("dup".to_string()));
        assert_eq!(registry.len(), 1);

        let tool = registry.resolve("dup").unwrap();
        let output = tool.handler().execute(ValidatedArguments::default()).await;
        assert_eq!(output, Ok(ToolOutput::text("first")));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register_handler(echo(name, "")).unwrap();
        }
        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        let mcp_names: Vec<String> = registry
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(mcp_names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_register_with_explicit_descriptor() {
        let mut registry = ToolRegistry::new();
        let descriptor = ToolDescriptor::new("renamed", "Custom description", Schema::new());
        registry
            .register(descriptor, Arc::new(echo("echo_default", "")))
            .unwrap();

        assert!(registry.contains("renamed"));
        assert!(!registry.contains("echo_default"));
        assert_eq!(registry.list()[0].description, "Custom description");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list_tools().is_empty());
    }
}
