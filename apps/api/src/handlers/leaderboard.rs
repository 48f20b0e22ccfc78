use axum::Json;
use axum::extract::{Query, State};
use summitdesk_application::LeaderboardQuery;

use crate::dto::{LeaderboardQueryParams, LeaderboardResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn leaderboard_handler(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQueryParams>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let view = state
        .leaderboard_service
        .get_leaderboard(LeaderboardQuery {
            top_limit: params.limit,
            sample_size: params.sample_size,
            force_refresh: params.force_refresh.unwrap_or(false),
        })
        .await?;

    Ok(Json(view.into()))
}
