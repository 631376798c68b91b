//! In-process publisher that records instead of sending.

use crate::error::{RealtimeError, Result};
use crate::traits::Publisher;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

/// One recorded publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub channel: String,
    pub data: serde_json::Value,
}

/// Records publishes in call order. Channels marked with
/// [`fail_channel`](Self::fail_channel) return an error instead.
#[derive(Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<Published>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_channel(&self, channel: impl Into<String>) {
        self.failing.lock().insert(channel.into());
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn channels(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .map(|p| p.channel.clone())
            .collect()
    }

    pub fn on_channel(&self, channel: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .iter()
            .filter(|p| p.channel == channel)
            .map(|p| p.data.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, channel: &str, data: serde_json::Value) -> Result<()> {
        if self.failing.lock().contains(channel) {
            return Err(RealtimeError::Unavailable(format!(
                "channel {} is marked as failing",
                channel
            )));
        }
        self.published.lock().push(Published {
            channel: channel.to_string(),
            data,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_in_order() {
        let publisher = MemoryPublisher::new();
        publisher.publish("a", json!({"n": 1})).await.unwrap();
        publisher.publish("b", json!({"n": 2})).await.unwrap();

        assert_eq!(publisher.channels(), vec!["a", "b"]);
        assert_eq!(publisher.on_channel("b"), vec![json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_failing_channel_is_not_recorded() {
        let publisher = MemoryPublisher::new();
        publisher.fail_channel("chat:bob");

        let result = publisher.publish("chat:bob", json!({})).await;
        assert!(result.is_err());
        assert!(publisher.published().is_empty());
    }
}
