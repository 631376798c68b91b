use crate::core::{AppState, Ctx, Result};
use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionToken {
    pub token: String,
    pub expires_in: i64,
}

/// GET /realtime/token
///
/// Token the caller's client presents when connecting to the broker.
pub async fn get_connection_token(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<ConnectionToken>> {
    info!("GET /realtime/token - {}", ctx.user_id());
    let token = realtime::generate_connection_token(
        ctx.user_id(),
        &state.config.hmac_secret,
        state.config.token_ttl,
    )?;
    Ok(Json(ConnectionToken {
        token,
        expires_in: state.config.token_ttl.num_seconds(),
    }))
}
