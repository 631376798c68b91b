use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Failures surfaced by the chat services. Each variant has a fixed code that
/// clients match on.
#[derive(Error, Debug)]
pub enum ChatError {
    // Chat
    #[error("Not connected with this user")]
    NotConnected,
    #[error("Not a participant in this conversation")]
    NotParticipant,
    #[error("Cannot send message - connection has been removed")]
    ConnectionRemoved,

    // Connections
    #[error("Cannot connect with yourself")]
    SelfConnection,
    #[error("Already connected with this user")]
    AlreadyConnected,
    #[error("Connection request already pending")]
    PendingRequest,
    #[error("Please wait before sending another request to this user")]
    CooldownPeriod,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("You do not have permission to modify this connection")]
    Forbidden,
    #[error("Connection is not in a valid state for this action")]
    InvalidStatus,

    // Boundary
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),

    // Collaborators
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Realtime error: {0}")]
    Realtime(#[from] realtime::RealtimeError),
}

impl ChatError {
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::NotConnected => "NOT_CONNECTED",
            ChatError::NotParticipant => "NOT_PARTICIPANT",
            ChatError::ConnectionRemoved => "CONNECTION_REMOVED",
            ChatError::SelfConnection => "SELF_CONNECTION",
            ChatError::AlreadyConnected => "ALREADY_CONNECTED",
            ChatError::PendingRequest => "PENDING_REQUEST",
            ChatError::CooldownPeriod => "COOLDOWN_PERIOD",
            ChatError::NotFound(_) => "NOT_FOUND",
            ChatError::Forbidden => "FORBIDDEN",
            ChatError::InvalidStatus => "INVALID_STATUS",
            ChatError::Validation(_) => "BAD_REQUEST",
            ChatError::Unauthorized(_) => "UNAUTHORIZED",
            ChatError::Database(_) | ChatError::Realtime(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::NotConnected
            | ChatError::NotParticipant
            | ChatError::ConnectionRemoved
            | ChatError::Forbidden => StatusCode::FORBIDDEN,
            ChatError::SelfConnection | ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::AlreadyConnected
            | ChatError::PendingRequest
            | ChatError::InvalidStatus => StatusCode::CONFLICT,
            ChatError::CooldownPeriod => StatusCode::TOO_MANY_REQUESTS,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ChatError::Database(_) | ChatError::Realtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store and broker details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_codes() {
        assert_eq!(ChatError::NotConnected.code(), "NOT_CONNECTED");
        assert_eq!(ChatError::NotParticipant.code(), "NOT_PARTICIPANT");
        assert_eq!(ChatError::ConnectionRemoved.code(), "CONNECTION_REMOVED");
    }

    #[test]
    fn test_connection_removed_is_actionable() {
        let err = ChatError::ConnectionRemoved;
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("connection has been removed"));
    }

    #[test]
    fn test_database_error_is_internal() {
        let err = ChatError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
