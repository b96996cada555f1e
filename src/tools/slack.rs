//! Slack tools: `slack_list_channels` and `slack_post_message`.
//!
//! Slack's JSON reply is passed through unmodified as the response text.

use std::sync::Arc;

use serde_json::json;

use crate::slack_client::MessagingApi;
use crate::tools::envelope::{HandlerFailure, ToolOutput};
use crate::tools::registry::{HandlerFuture, ToolHandler};
use crate::tools::schema::{Field, Schema, ValidatedArguments};

/// Page size used when the caller does not pass `limit`.
pub const DEFAULT_CHANNEL_LIMIT: u64 = 100;

/// Handler for `slack_list_channels`.
pub struct ListChannelsHandler<M> {
    api: Arc<M>,
}

impl<M: MessagingApi> ListChannelsHandler<M> {
    pub fn new(api: Arc<M>) -> Self {
        Self { api }
    }
}

impl<M: MessagingApi> ToolHandler for ListChannelsHandler<M> {
    fn name(&self) -> &str {
        "slack_list_channels"
    }

    fn description(&self) -> &str {
        "List public Slack channels"
    }

    fn input_schema(&self) -> Schema {
        Schema::new()
            .field(
                Field::number("limit")
                    .description("Maximum number of channels to return")
                    .default(json!(DEFAULT_CHANNEL_LIMIT)),
            )
            .field(Field::string("cursor").description("Pagination cursor from a previous call"))
    }

    fn execute(&self, args: ValidatedArguments) -> HandlerFuture<'_> {
        Box::pin(async move {
            let limit = match args.get("limit") {
                None => DEFAULT_CHANNEL_LIMIT,
                Some(_) => args.u64("limit").ok_or_else(|| {
                    HandlerFailure::new("Invalid arguments", "`limit` must be a non-negative integer")
                })?,
            };
            let cursor = args.str("cursor");

            let result = self
                .api
                .list_channels(limit, cursor)
                .await
                .map_err(|e| HandlerFailure::new("Error listing channels", e))?;
            Ok(ToolOutput::text(result.to_string()))
        })
    }
}

/// Handler for `slack_post_message`.
pub struct PostMessageHandler<M> {
    api: Arc<M>,
}

impl<M: MessagingApi> PostMessageHandler<M> {
    pub fn new(api: Arc<M>) -> Self {
        Self { api }
    }
}

impl<M: MessagingApi> ToolHandler for PostMessageHandler<M> {
    fn name(&self) -> &str {
        "slack_post_message"
    }

    fn description(&self) -> &str {
        "Post a message to a Slack channel"
    }

    fn input_schema(&self) -> Schema {
        Schema::new()
            .field(
                Field::string("channel_id")
                    .description("ID of the channel to post to")
                    .required(),
            )
            .field(Field::string("text").description("Message text").required())
    }

    fn execute(&self, args: ValidatedArguments) -> HandlerFuture<'_> {
        Box::pin(async move {
            let channel_id = args.require_str("channel_id")?;
            let text = args.require_str("text")?;

            let result = self
                .api
                .post_message(channel_id, text)
                .await
                .map_err(|e| HandlerFailure::new("Error posting message", e))?;
            Ok(ToolOutput::text(result.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack_client::SlackError;
    use crate::tools::dispatch::{Dispatcher, InvocationRequest, render_json};
    use crate::tools::registry::ToolRegistry;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls and answers with canned Slack payloads.
    #[derive(Default)]
    struct MockSlack {
        calls: AtomicUsize,
        last_list: Mutex<Option<(u64, Option<String>)>>,
        last_post: Mutex<Option<(String, String)>>,
        fail_status: Option<u16>,
    }

    impl MessagingApi for MockSlack {
        async fn list_channels(&self, limit: u64, cursor: Option<&str>) -> Result<Value, SlackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_list.lock().unwrap() = Some((limit, cursor.map(str::to_string)));
            if let Some(status) = self.fail_status {
                return Err(SlackError::Status {
                    status,
                    body: "{\"ok\":false}".to_string(),
                });
            }
            Ok(json!({ "ok": true, "channels": [{ "id": "C1", "name": "general" }] }))
        }

        async fn post_message(&self, channel_id: &str, text: &str) -> Result<Value, SlackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_post.lock().unwrap() = Some((channel_id.to_string(), text.to_string()));
            if let Some(status) = self.fail_status {
                return Err(SlackError::Status {
                    status,
                    body: "rate limited".to_string(),
                });
            }
            Ok(json!({ "ok": true, "channel": channel_id, "ts": "1700000000.000100" }))
        }
    }

    fn dispatcher(api: Arc<MockSlack>) -> Dispatcher {
        let registry = ToolRegistry::new()
            .with_handler(ListChannelsHandler::new(api.clone()))
            .unwrap()
            .with_handler(PostMessageHandler::new(api))
            .unwrap();
        Dispatcher::new(Arc::new(registry)).with_failure_renderer(render_json)
    }

    fn request(name: &str, args: Value) -> InvocationRequest {
        InvocationRequest::new(name, args.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn test_post_message_missing_text_never_calls_slack() {
        let api = Arc::new(MockSlack::default());
        let dispatcher = dispatcher(api.clone());

        let response = dispatcher
            .dispatch(request("slack_post_message", json!({ "channel_id": "C1" })))
            .await;
        assert!(response.is_error());
        let body: Value = serde_json::from_str(&response.text()).unwrap();
        assert!(body["error"].as_str().unwrap().contains("`text`"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_message_passes_acknowledgement_through() {
        let api = Arc::new(MockSlack::default());
        let dispatcher = dispatcher(api.clone());

        let response = dispatcher
            .dispatch(request(
                "slack_post_message",
                json!({ "channel_id": "C1", "text": "Q3 pipeline attached" }),
            ))
            .await;
        assert!(!response.is_error());
        let body: Value = serde_json::from_str(&response.text()).unwrap();
        assert_eq!(body["ts"], "1700000000.000100");
        assert_eq!(
            *api.last_post.lock().unwrap(),
            Some(("C1".to_string(), "Q3 pipeline attached".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_channels_uses_default_limit() {
        let api = Arc::new(MockSlack::default());
        let dispatcher = dispatcher(api.clone());

        let response = dispatcher
            .dispatch(request("slack_list_channels", json!({})))
            .await;
        assert!(!response.is_error());
        assert_eq!(*api.last_list.lock().unwrap(), Some((DEFAULT_CHANNEL_LIMIT, None)));

        dispatcher
            .dispatch(request("slack_list_channels", json!({ "limit": 10, "cursor": "abc" })))
            .await;
        assert_eq!(
            *api.last_list.lock().unwrap(),
            Some((10, Some("abc".to_string())))
        );
    }

    #[tokio::test]
    async fn test_list_channels_rejects_string_limit() {
        let api = Arc::new(MockSlack::default());
        let dispatcher = dispatcher(api.clone());

        let response = dispatcher
            .dispatch(request("slack_list_channels", json!({ "limit": "ten" })))
            .await;
        assert!(response.is_error());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_channels_rejects_non_integral_limit() {
        let api = Arc::new(MockSlack::default());
        let dispatcher = dispatcher(api.clone());

        for limit in [json!(-5), json!(2.5)] {
            let response = dispatcher
                .dispatch(request("slack_list_channels", json!({ "limit": limit })))
                .await;
            assert!(response.is_error());
            let body: Value = serde_json::from_str(&response.text()).unwrap();
            assert_eq!(
                body,
                json!({ "error": "Invalid arguments: `limit` must be a non-negative integer" })
            );
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);

        let response = dispatcher
            .dispatch(request("slack_list_channels", json!({ "limit": 0 })))
            .await;
        assert!(!response.is_error());
        assert_eq!(*api.last_list.lock().unwrap(), Some((0, None)));
    }

    #[tokio::test]
    async fn test_http_status_is_failure_response() {
        let api = Arc::new(MockSlack {
            fail_status: Some(429),
            ..Default::default()
        });
        let dispatcher = dispatcher(api);

        let response = dispatcher
            .dispatch(request("slack_post_message", json!({ "channel_id": "C1", "text": "hi" })))
            .await;
        assert!(response.is_error());
        let body: Value = serde_json::from_str(&response.text()).unwrap();
        assert_eq!(
            body,
            json!({ "error": "Error posting message: Slack API returned HTTP 429: rate limited" })
        );
    }

    #[test]
    fn test_schemas() {
        let api = Arc::new(MockSlack::default());
        let post = PostMessageHandler::new(api.clone()).input_schema();
        let required: Vec<&str> = post.required_fields().collect();
        assert_eq!(required, vec!["channel_id", "text"]);

        let list = ListChannelsHandler::new(api).input_schema().to_json_schema();
        assert_eq!(list["properties"]["limit"]["default"], json!(100));
        assert!(!list.contains_key("required"));
    }
}
