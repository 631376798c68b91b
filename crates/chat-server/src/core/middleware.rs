use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::{ChatError, Result};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Require `Authorization: Bearer <jwt>` signed with the auth secret. The
/// token subject becomes the caller's user id.
pub async fn mw_require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_auth");

    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(h) => h
            .to_str()
            .map_err(|_| ChatError::Unauthorized("Malformed authorization header"))?,
        None => return Err(ChatError::Unauthorized("Missing bearer token")),
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ChatError::Unauthorized("Malformed authorization header"))?;

    let claims = realtime::verify_token(token, &state.config.auth_secret).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ChatError::Unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(Ctx::new(claims.sub));

    Ok(next.run(req).await)
}
