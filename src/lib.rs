// Core modules
pub mod config;
pub mod db;
pub mod slack_client;
pub mod tools;

pub mod api;
pub mod server;

// Re-export key types and functions
pub use config::{DatabaseConfig, SlackConfig, UploadConfig};
pub use db::{PgStore, RowStore, StoreError};
pub use server::ToolServer;
pub use slack_client::{MessagingApi, SlackClient};
pub use tools::{Dispatcher, ToolHandler, ToolRegistry};

use std::sync::Arc;
use tools::{
    CrmQueryTool, ListChannelsHandler, PostMessageHandler, RegistryError, UploadReportHandler,
    render_json,
};

/// Server exposing `getOpportunities` and `getSupportCases` over `store`.
pub fn create_crm_server<S: RowStore>(store: Arc<S>) -> Result<ToolServer, RegistryError> {
    let registry = ToolRegistry::new()
        .with_handler(CrmQueryTool::opportunities(store.clone()))?
        .with_handler(CrmQueryTool::support_cases(store))?;

    Ok(ToolServer::new(
        Dispatcher::new(Arc::new(registry)),
        "CRM tools: active opportunities and support cases from the sales & support portal.",
    ))
}

/// Server exposing `slack_list_channels` and `slack_post_message`.
///
/// Failures are rendered as `{"error": "..."}` so clients can parse every
/// reply of this suite as JSON.
pub fn create_slack_server<M: MessagingApi>(api: Arc<M>) -> Result<ToolServer, RegistryError> {
    let registry = ToolRegistry::new()
        .with_handler(ListChannelsHandler::new(api.clone()))?
        .with_handler(PostMessageHandler::new(api))?;

    Ok(ToolServer::new(
        Dispatcher::new(Arc::new(registry)).with_failure_renderer(render_json),
        "Slack tools: list public channels and post messages.",
    ))
}

/// Server exposing `upload_report_pdf`.
pub fn create_upload_server(config: &UploadConfig) -> Result<ToolServer, RegistryError> {
    let registry = ToolRegistry::new().with_handler(UploadReportHandler::new(config))?;

    Ok(ToolServer::new(
        Dispatcher::new(Arc::new(registry)),
        "Report tools: register a PDF report and get its repository URL.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_server_tools() {
        let server = create_upload_server(&UploadConfig::default()).unwrap();
        let names: Vec<String> = server
            .dispatcher()
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, vec!["upload_report_pdf"]);
    }

    #[test]
    fn test_slack_server_tool_order() {
        let config = SlackConfig::new(Some("xoxb-test".into()), "https://slack.com/api").unwrap();
        let client = Arc::new(SlackClient::new(&config).unwrap());
        let server = create_slack_server(client).unwrap();
        let names: Vec<String> = server
            .tool_registry()
            .list()
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(names, vec!["slack_list_channels", "slack_post_message"]);
    }
}
