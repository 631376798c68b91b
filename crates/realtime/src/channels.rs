//! Channel naming shared by the server and its clients.

/// Channel carrying every event for one conversation.
pub fn conversation_channel(conversation_id: &str) -> String {
    format!("conversation:{}", conversation_id)
}

/// Personal feed of a single user, independent of which conversation is open.
pub fn user_channel(user_id: &str) -> String {
    format!("chat:{}", user_id)
}
