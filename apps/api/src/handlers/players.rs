use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{PlayerListParams, PlayerPageResponse, PlayerRecordResponse, SavePlayerRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_player_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> ApiResult<Json<PlayerRecordResponse>> {
    let record = state.player_service.get_player(&player).await?;
    Ok(Json(record.into()))
}

pub async fn save_player_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<SavePlayerRequest>,
) -> ApiResult<Json<PlayerRecordResponse>> {
    let record = state
        .player_service
        .save_player(&player, request.data)
        .await?;

    Ok(Json(record.into()))
}

pub async fn delete_player_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> ApiResult<StatusCode> {
    state.player_service.delete_player(&player).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_players_handler(
    State(state): State<AppState>,
    Query(params): Query<PlayerListParams>,
) -> ApiResult<Json<PlayerPageResponse>> {
    let page = state
        .player_service
        .list_players(params.limit, params.cursor.as_deref())
        .await?;

    Ok(Json(page.into()))
}
