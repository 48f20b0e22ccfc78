use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::{NametagResponse, SaveNametagRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_nametag_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> ApiResult<Json<NametagResponse>> {
    let record = state.nametag_service.get_nametag(&player).await?;
    Ok(Json(record.into()))
}

pub async fn save_nametag_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<SaveNametagRequest>,
) -> ApiResult<Json<NametagResponse>> {
    let record = state
        .nametag_service
        .save_nametag(&player, request.data)
        .await?;

    Ok(Json(record.into()))
}

pub async fn delete_nametag_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> ApiResult<StatusCode> {
    state.nametag_service.delete_nametag(&player).await?;
    Ok(StatusCode::NO_CONTENT)
}
