//! HTTP publish client for the broker's server API.

use crate::error::{RealtimeError, Result};
use crate::traits::Publisher;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Connection settings for the broker's HTTP API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Base URL of the broker, without the `/api` suffix.
    pub url: String,
    /// Server API key, sent as `Authorization: apikey <key>`.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl BrokerConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn publish_url(&self) -> String {
        format!("{}/api/publish", self.url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct PublishBody<'a> {
    channel: &'a str,
    data: serde_json::Value,
}

pub struct CentrifugoClient {
    client: Client,
    config: BrokerConfig,
}

impl CentrifugoClient {
    pub fn new(config: BrokerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

#[async_trait]
impl Publisher for CentrifugoClient {
    async fn publish(&self, channel: &str, data: serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(self.config.publish_url())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("apikey {}", self.config.api_key),
            )
            .json(&PublishBody { channel, data })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RealtimeError::Rejected {
                channel: channel.to_string(),
                status: status.as_u16(),
            });
        }

        debug!("[Realtime] Published to {}", channel);
        Ok(())
    }
}
