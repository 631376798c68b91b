use crate::core::{AppState, Ctx, Result};
use crate::models::{
    ConversationPage, ConversationWithParticipants, GetMessages, GetOrCreateConversation,
    ListConversations, MarkAsRead, Message, MessagePage, SearchMessages, SearchResults,
    SendMessage, Success, UnreadCount,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

/// POST /chat/conversations
pub async fn get_or_create_conversation(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(input): Json<GetOrCreateConversation>,
) -> Result<Json<ConversationWithParticipants>> {
    info!("POST /chat/conversations - {} <-> {}", ctx.user_id(), input.user_id);
    input.validate()?;
    let conversation = state
        .chat
        .get_or_create_conversation(ctx.user_id(), &input)
        .await?;
    Ok(Json(conversation))
}

/// GET /chat/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    ctx: Ctx,
    Query(input): Query<ListConversations>,
) -> Result<Json<ConversationPage>> {
    info!("GET /chat/conversations - {}", ctx.user_id());
    input.validate()?;
    let page = state.chat.list_conversations(ctx.user_id(), &input).await?;
    Ok(Json(page))
}

/// POST /chat/messages
pub async fn send_message(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(input): Json<SendMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    input.validate()?;
    info!(
        "POST /chat/messages - {} -> {}",
        ctx.user_id(),
        input.conversation_id
    );
    let message = state.chat.send_message(ctx.user_id(), &input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
    pub before: Option<String>,
}

/// GET /chat/conversations/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(conversation_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagePage>> {
    info!("GET /chat/conversations/{}/messages - {}", conversation_id, ctx.user_id());
    let mut input = GetMessages::latest(conversation_id);
    if let Some(limit) = query.limit {
        input.limit = limit;
    }
    input.before = query.before.filter(|b| !b.is_empty());
    input.validate()?;

    let page = state.chat.get_messages(ctx.user_id(), &input).await?;
    Ok(Json(page))
}

/// POST /chat/conversations/{id}/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(conversation_id): Path<String>,
) -> Result<Json<Success>> {
    info!("POST /chat/conversations/{}/read - {}", conversation_id, ctx.user_id());
    let input = MarkAsRead { conversation_id };
    input.validate()?;
    let success = state.chat.mark_as_read(ctx.user_id(), &input).await?;
    Ok(Json(success))
}

/// GET /chat/unread
pub async fn get_unread_count(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<UnreadCount>> {
    info!("GET /chat/unread - {}", ctx.user_id());
    let unread = state.chat.get_unread_count(ctx.user_id()).await?;
    Ok(Json(unread))
}

/// GET /chat/search
pub async fn search_messages(
    State(state): State<AppState>,
    ctx: Ctx,
    Query(input): Query<SearchMessages>,
) -> Result<Json<SearchResults>> {
    info!("GET /chat/search - {}", ctx.user_id());
    input.validate()?;
    let results = state.chat.search_messages(ctx.user_id(), &input).await?;
    Ok(Json(results))
}
