//! Core Service Layer
//!
//! Shared infrastructure for the chat server: configuration, request
//! context, authentication, errors and routing.

pub mod config;
pub mod ctx;
pub mod error;
pub mod middleware;
pub mod router;

// Re-exports for convenience
pub use config::{AppState, ChatServerConfig};
pub use ctx::Ctx;
pub use error::{ChatError, Result};
pub use router::router;
