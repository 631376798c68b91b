use crate::error::Result;
use async_trait::async_trait;

/// Anything that can push a JSON payload onto a named broker channel.
///
/// Services hold an `Arc<dyn Publisher>` so tests can swap in
/// [`MemoryPublisher`](crate::MemoryPublisher).
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    async fn publish(&self, channel: &str, data: serde_json::Value) -> Result<()>;
}
