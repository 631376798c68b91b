//! Request inputs and their boundary validation.

use super::{MessageType, PresenceStatus};
use crate::core::error::{ChatError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_CONTENT_LEN: usize = 10_000;
pub const MAX_PAGE_LIMIT: i64 = 100;

fn default_page_limit() -> i64 {
    50
}

fn default_search_limit() -> i64 {
    20
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChatError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

fn check_limit(limit: i64) -> Result<()> {
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ChatError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

fn check_offset(offset: i64) -> Result<()> {
    if offset < 0 {
        return Err(ChatError::Validation("offset must not be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrCreateConversation {
    pub user_id: String,
}

impl GetOrCreateConversation {
    pub fn validate(&self) -> Result<()> {
        require(&self.user_id, "User ID")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConversations {
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListConversations {
    fn default() -> Self {
        Self {
            limit: default_page_limit(),
            offset: 0,
        }
    }
}

impl ListConversations {
    pub fn validate(&self) -> Result<()> {
        check_limit(self.limit)?;
        check_offset(self.offset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub conversation_id: String,
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub reply_to_message_id: Option<String>,
}

impl SendMessage {
    pub fn text(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: content.into(),
            kind: MessageType::Text,
            metadata: None,
            reply_to_message_id: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.conversation_id, "Conversation ID")?;
        if self.content.is_empty() {
            return Err(ChatError::Validation("Message content is required".into()));
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(ChatError::Validation(format!(
                "Message content must be at most {} characters",
                MAX_CONTENT_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessages {
    pub conversation_id: String,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    /// Message id; only strictly older messages are returned.
    #[serde(default)]
    pub before: Option<String>,
}

impl GetMessages {
    pub fn latest(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            limit: default_page_limit(),
            before: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.conversation_id, "Conversation ID")?;
        check_limit(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsRead {
    pub conversation_id: String,
}

impl MarkAsRead {
    pub fn validate(&self) -> Result<()> {
        require(&self.conversation_id, "Conversation ID")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMessages {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

impl SearchMessages {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_search_limit(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.is_empty() {
            return Err(ChatError::Validation("Search query is required".into()));
        }
        check_limit(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConnectionRequest {
    pub connected_user_id: String,
}

impl SendConnectionRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.connected_user_id, "User ID")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConnections {
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListConnections {
    fn default() -> Self {
        Self {
            limit: default_page_limit(),
            offset: 0,
        }
    }
}

impl ListConnections {
    pub fn validate(&self) -> Result<()> {
        check_limit(self.limit)?;
        check_offset(self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingDirection {
    Received,
    Sent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingRequests {
    #[serde(rename = "type")]
    pub direction: PendingDirection,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl ListPendingRequests {
    pub fn validate(&self) -> Result<()> {
        check_limit(self.limit)?;
        check_offset(self.offset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePresence {
    pub status: PresenceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingInput {
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_defaults_to_text() {
        let input: SendMessage =
            serde_json::from_str(r#"{"conversationId":"c1","content":"hi"}"#).unwrap();
        assert_eq!(input.kind, MessageType::Text);
        assert!(input.metadata.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_send_message_content_bounds() {
        assert!(SendMessage::text("c1", "").validate().is_err());
        assert!(SendMessage::text("c1", "a".repeat(MAX_CONTENT_LEN)).validate().is_ok());
        assert!(SendMessage::text("c1", "a".repeat(MAX_CONTENT_LEN + 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_page_defaults_and_limits() {
        let list: ListConversations = serde_json::from_str("{}").unwrap();
        assert_eq!(list.limit, 50);
        assert_eq!(list.offset, 0);

        let search: SearchMessages = serde_json::from_str(r#"{"query":"hi"}"#).unwrap();
        assert_eq!(search.limit, 20);

        let too_big = ListConversations { limit: 101, offset: 0 };
        assert!(too_big.validate().is_err());
        let negative = ListConversations { limit: 10, offset: -1 };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_blank_ids_rejected() {
        let input = GetOrCreateConversation { user_id: "  ".into() };
        assert!(matches!(input.validate(), Err(ChatError::Validation(_))));
        assert!(MarkAsRead { conversation_id: String::new() }.validate().is_err());
    }
}
