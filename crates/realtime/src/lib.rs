//! Real-time broker integration
//!
//! Thin client for a Centrifugo-compatible broker. The chat server only ever
//! pushes to the broker; nothing here reads state back.

pub mod channels;
pub mod client;
pub mod error;
pub mod memory;
pub mod token;
pub mod traits;

pub use channels::{conversation_channel, user_channel};
pub use client::{BrokerConfig, CentrifugoClient};
pub use error::{RealtimeError, Result};
pub use memory::{MemoryPublisher, Published};
pub use token::{generate_connection_token, parse_ttl, verify_token, Claims};
pub use traits::Publisher;
