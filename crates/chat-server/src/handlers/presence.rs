use crate::core::{AppState, Ctx, Result};
use crate::models::{Success, TypingInput, UpdatePresence, UserPresence};
use crate::presence::ConnectionStatuses;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

/// PUT /presence
pub async fn update_presence(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(input): Json<UpdatePresence>,
) -> Result<Json<UserPresence>> {
    info!("PUT /presence - {} {:?}", ctx.user_id(), input.status);
    let presence = state
        .presence
        .update_status(ctx.user_id(), input.status)
        .await?;
    Ok(Json(presence))
}

/// GET /presence/connections
pub async fn get_connections_status(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<ConnectionStatuses>> {
    info!("GET /presence/connections - {}", ctx.user_id());
    let statuses = state.presence.get_connections_status(ctx.user_id()).await?;
    Ok(Json(statuses))
}

/// POST /chat/conversations/{id}/typing
pub async fn send_typing(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(conversation_id): Path<String>,
    Json(input): Json<TypingInput>,
) -> Result<Json<Success>> {
    info!("POST /chat/conversations/{}/typing - {}", conversation_id, ctx.user_id());
    let success = state
        .presence
        .broadcast_typing(ctx.user_id(), &conversation_id, input.is_typing)
        .await?;
    Ok(Json(success))
}
