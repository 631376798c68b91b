//! HTTP handlers
//!
//! Each handler validates its input, then delegates to one service call.

pub mod broker;
pub mod chat;
pub mod connections;
pub mod presence;

pub use broker::*;
pub use chat::*;
pub use connections::*;
pub use presence::*;
