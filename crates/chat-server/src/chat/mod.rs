//! Chat Service
//!
//! Conversation resolution, message send with real-time fan-out, read
//! tracking and search. Every call re-reads from the store; the broker only
//! receives notification hints.

pub mod events;

use crate::core::error::{ChatError, Result};
use crate::models::{
    now, Conversation, ConversationParticipant, ConversationPage, ConversationType,
    ConversationWithParticipants, GetMessages, GetOrCreateConversation, ListConversations,
    MarkAsRead, Message, MessagePage, MessageWithSender, SearchMessages, SearchResults,
    SendMessage, Success, UnreadCount,
};
use crate::store::ChatStore;
use events::{fan_out, publish_event, ChatEvent};
use realtime::{conversation_channel, user_channel, Publisher};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct ChatService {
    store: ChatStore,
    publisher: Arc<dyn Publisher>,
}

impl ChatService {
    pub fn new(store: ChatStore, publisher: Arc<dyn Publisher>) -> Self {
        Self { store, publisher }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    async fn require_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ConversationParticipant> {
        self.store
            .get_participant(conversation_id, user_id)
            .await?
            .ok_or(ChatError::NotParticipant)
    }

    async fn with_participants(
        &self,
        conversation: Conversation,
    ) -> Result<ConversationWithParticipants> {
        let participants = self.store.participants_with_users(&conversation.id).await?;
        Ok(ConversationWithParticipants {
            conversation,
            participants,
        })
    }

    /// Return the direct conversation between the caller and `input.user_id`,
    /// creating it if needed. Requires an accepted connection.
    pub async fn get_or_create_conversation(
        &self,
        user_id: &str,
        input: &GetOrCreateConversation,
    ) -> Result<ConversationWithParticipants> {
        let other_id = input.user_id.as_str();
        if !self.store.has_accepted_connection(user_id, other_id).await? {
            return Err(ChatError::NotConnected);
        }

        let conversation = match self.store.find_direct_conversation(user_id, other_id).await? {
            Some(existing) => {
                debug!("[Chat] Reusing conversation {}", existing.id);
                existing
            }
            None => {
                let created = self.store.create_direct_conversation(user_id, other_id).await?;
                info!(
                    "[Chat] Direct conversation {} ready for {} and {}",
                    created.id, user_id, other_id
                );
                created
            }
        };

        // Never hand out a conversation the caller is not part of.
        self.require_participant(&conversation.id, user_id).await?;
        self.require_participant(&conversation.id, other_id).await?;
        self.with_participants(conversation).await
    }

    /// The caller's conversations, most recently active first.
    pub async fn list_conversations(
        &self,
        user_id: &str,
        input: &ListConversations,
    ) -> Result<ConversationPage> {
        let conversations = self
            .store
            .list_conversation_summaries(user_id, input.limit, input.offset)
            .await?;
        let total = self.store.count_conversations(user_id).await?;
        let has_more = input.offset + (conversations.len() as i64) < total;

        Ok(ConversationPage {
            conversations,
            total,
            has_more,
        })
    }

    /// Persist a message, then notify the conversation channel and every
    /// participant's personal channel. Publish failures never fail the send.
    pub async fn send_message(&self, user_id: &str, input: &SendMessage) -> Result<Message> {
        let conversation_id = input.conversation_id.as_str();
        self.require_participant(conversation_id, user_id).await?;

        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or(ChatError::NotFound("Conversation"))?;

        // Conversations outlive connections; sending does not.
        if conversation.kind == ConversationType::Direct {
            if let Some(other_id) = self
                .store
                .other_participant_id(conversation_id, user_id)
                .await?
            {
                if !self.store.has_accepted_connection(user_id, &other_id).await? {
                    return Err(ChatError::ConnectionRemoved);
                }
            }
        }

        let at = now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: user_id.to_string(),
            content: input.content.clone(),
            kind: input.kind,
            metadata: input.metadata.clone(),
            reply_to_message_id: input.reply_to_message_id.clone(),
            delivered_at: Some(at),
            edited_at: None,
            is_edited: false,
            deleted_at: None,
            created_at: at,
            updated_at: at,
        };
        self.store.insert_message(&message).await?;

        let sender = self
            .store
            .get_public_user(user_id)
            .await?
            .ok_or(ChatError::NotFound("User"))?;

        self.store
            .touch_last_message(conversation_id, &message.created_at)
            .await?;

        let participants = self.store.list_participants(conversation_id).await?;
        let with_sender = MessageWithSender {
            message: message.clone(),
            sender,
        };

        publish_event(
            self.publisher.as_ref(),
            &conversation_channel(conversation_id),
            &ChatEvent::NewMessage {
                conversation_id: None,
                message: with_sender.clone(),
            },
        )
        .await;

        let delivered = fan_out(
            self.publisher.as_ref(),
            participants.iter().map(|p| user_channel(&p.user_id)),
            &ChatEvent::NewMessage {
                conversation_id: Some(conversation_id.to_string()),
                message: with_sender,
            },
        )
        .await;

        debug!(
            "[Chat] Message {} sent to {} ({}/{} personal channels notified)",
            message.id,
            conversation_id,
            delivered,
            participants.len()
        );

        Ok(message)
    }

    /// One page of history, oldest first. `before` is a message id; an id that
    /// does not resolve leaves the page unfiltered.
    pub async fn get_messages(&self, user_id: &str, input: &GetMessages) -> Result<MessagePage> {
        self.require_participant(&input.conversation_id, user_id)
            .await?;

        let before = match input.before.as_deref() {
            Some(id) => self.store.get_message(id).await?.map(|m| m.created_at),
            None => None,
        };

        let messages = self
            .store
            .messages_page(&input.conversation_id, input.limit, before.as_ref())
            .await?;
        // A full page reports more even when nothing older remains.
        let has_more = messages.len() as i64 == input.limit;

        Ok(MessagePage { messages, has_more })
    }

    pub async fn mark_as_read(&self, user_id: &str, input: &MarkAsRead) -> Result<Success> {
        self.require_participant(&input.conversation_id, user_id)
            .await?;
        self.store
            .mark_read(&input.conversation_id, user_id, &now())
            .await?;
        Ok(Success::OK)
    }

    pub async fn get_unread_count(&self, user_id: &str) -> Result<UnreadCount> {
        let count = self.store.unread_total(user_id).await?;
        Ok(UnreadCount { count })
    }

    /// Substring search over messages in the caller's conversations, newest
    /// first.
    pub async fn search_messages(
        &self,
        user_id: &str,
        input: &SearchMessages,
    ) -> Result<SearchResults> {
        let results = self
            .store
            .search_messages(user_id, &input.query, input.limit)
            .await?;
        let total = results.len();
        Ok(SearchResults { results, total })
    }
}
