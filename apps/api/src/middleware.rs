use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use summitdesk_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Requires a live admin session presented as a bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    if !state.sessions.validate(token).await {
        return Err(AppError::Unauthorized("session expired or unknown".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
