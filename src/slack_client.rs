//! Client for the Slack Web API.
//!
//! Responses are returned as raw JSON; Slack's own `ok: false` errors are
//! not interpreted here. Only a non-success HTTP status is an error.

use std::future::Future;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::config::SlackConfig;

/// Request timeout for Slack API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid Slack API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Operations the Slack tools need from a messaging API.
pub trait MessagingApi: Send + Sync + 'static {
    fn list_channels(
        &self,
        limit: u64,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<Value, SlackError>> + Send;

    fn post_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<Value, SlackError>> + Send;
}

/// Slack Web API client authenticated with a bot token.
pub struct SlackClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> Result<Url, SlackError> {
        endpoint(&self.api_url, method)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, SlackError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

fn endpoint(base: &Url, method: &str) -> Result<Url, SlackError> {
    let base = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{}/{}", base, method))?)
}

/// `conversations.list` URL for public, unarchived channels.
fn channels_url(base: &Url, limit: u64, cursor: Option<&str>) -> Result<Url, SlackError> {
    let mut url = endpoint(base, "conversations.list")?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("types", "public_channel")
            .append_pair("exclude_archived", "true")
            .append_pair("limit", &limit.to_string());
        if let Some(cursor) = cursor {
            query.append_pair("cursor", cursor);
        }
    }
    Ok(url)
}

impl MessagingApi for SlackClient {
    async fn list_channels(&self, limit: u64, cursor: Option<&str>) -> Result<Value, SlackError> {
        let url = channels_url(&self.api_url, limit, cursor)?;
        debug!(limit, has_cursor = cursor.is_some(), "Listing Slack channels");

        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        Self::read_json(response).await
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<Value, SlackError> {
        let url = self.endpoint("chat.postMessage")?;
        debug!(channel = channel_id, "Posting Slack message");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "channel": channel_id, "text": text }))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
