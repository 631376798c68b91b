use crate::core::{AppState, Ctx, Result};
use crate::models::{
    Connection, ConnectionPage, ListConnections, ListPendingRequests, SendConnectionRequest,
    Success,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// POST /connections
pub async fn send_connection_request(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(input): Json<SendConnectionRequest>,
) -> Result<(StatusCode, Json<Connection>)> {
    input.validate()?;
    info!(
        "POST /connections - {} -> {}",
        ctx.user_id(),
        input.connected_user_id
    );
    let connection = state
        .connections
        .send_request(ctx.user_id(), &input.connected_user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// GET /connections
pub async fn list_connections(
    State(state): State<AppState>,
    ctx: Ctx,
    Query(input): Query<ListConnections>,
) -> Result<Json<ConnectionPage>> {
    info!("GET /connections - {}", ctx.user_id());
    input.validate()?;
    let page = state
        .connections
        .list_connections(ctx.user_id(), &input)
        .await?;
    Ok(Json(page))
}

/// GET /connections/pending
pub async fn list_pending_requests(
    State(state): State<AppState>,
    ctx: Ctx,
    Query(input): Query<ListPendingRequests>,
) -> Result<Json<ConnectionPage>> {
    info!("GET /connections/pending - {}", ctx.user_id());
    input.validate()?;
    let page = state.connections.list_pending(ctx.user_id(), &input).await?;
    Ok(Json(page))
}

/// POST /connections/{id}/accept
pub async fn accept_connection(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(connection_id): Path<String>,
) -> Result<Json<Connection>> {
    info!("POST /connections/{}/accept - {}", connection_id, ctx.user_id());
    let connection = state
        .connections
        .accept(ctx.user_id(), &connection_id)
        .await?;
    Ok(Json(connection))
}

/// POST /connections/{id}/reject
pub async fn reject_connection(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(connection_id): Path<String>,
) -> Result<Json<Success>> {
    info!("POST /connections/{}/reject - {}", connection_id, ctx.user_id());
    let success = state
        .connections
        .reject(ctx.user_id(), &connection_id)
        .await?;
    Ok(Json(success))
}

/// DELETE /connections/{id}
pub async fn remove_connection(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(connection_id): Path<String>,
) -> Result<Json<Success>> {
    info!("DELETE /connections/{} - {}", connection_id, ctx.user_id());
    let success = state
        .connections
        .remove(ctx.user_id(), &connection_id)
        .await?;
    Ok(Json(success))
}
