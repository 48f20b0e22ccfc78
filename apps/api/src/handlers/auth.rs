use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use summitdesk_core::AppError;
use tracing::info;

use crate::dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if request.password != state.admin_password {
        return Err(AppError::Unauthorized("invalid password".to_owned()).into());
    }

    let token = state.sessions.issue().await?;
    info!("admin session issued");

    Ok(Json(LoginResponse { token }))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Session probe behind the auth middleware; reaching it means the token
/// is valid.
pub async fn session_handler() -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: true,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
