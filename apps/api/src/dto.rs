use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use summitdesk_application::{LeaderboardView, NametagRecord, PlayerPage, PlayerRecord};
use summitdesk_domain::LeaderboardEntry;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Admin login payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub password: String,
}

/// Issued session token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/login-response.ts"
)]
pub struct LoginResponse {
    pub token: String,
}

/// Session probe result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub authenticated: bool,
}

/// Leaderboard read query string.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/leaderboard-query-params.ts"
)]
pub struct LeaderboardQueryParams {
    pub limit: Option<usize>,
    pub sample_size: Option<usize>,
    pub force_refresh: Option<bool>,
}

/// One ranked leaderboard row.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/leaderboard-entry-response.ts"
)]
pub struct LeaderboardEntryResponse {
    pub rank: u32,
    pub username: String,
    pub user_id: String,
    pub summit: f64,
}

/// Leaderboard payload with cache metadata.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/leaderboard-response.ts"
)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryResponse>,
    pub sample_size: usize,
    #[ts(type = "string")]
    pub computed_at: DateTime<Utc>,
    pub cached: bool,
    pub cache_age_seconds: u64,
}

/// One stored player record.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/player-record-response.ts"
)]
pub struct PlayerRecordResponse {
    pub user_id: String,
    pub username: String,
    #[ts(type = "unknown")]
    pub data: Value,
}

/// Player record write payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/save-player-request.ts"
)]
pub struct SavePlayerRequest {
    #[ts(type = "unknown")]
    pub data: Value,
}

/// One stored nametag prefix record.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/nametag-response.ts"
)]
pub struct NametagResponse {
    pub user_id: String,
    pub username: String,
    #[ts(type = "unknown")]
    pub data: Value,
}

/// Nametag write payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/save-nametag-request.ts"
)]
pub struct SaveNametagRequest {
    #[ts(type = "unknown")]
    pub data: Value,
}

/// Player listing query string.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/player-list-params.ts"
)]
pub struct PlayerListParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// One row of a player listing.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/player-listing-response.ts"
)]
pub struct PlayerListingResponse {
    pub user_id: String,
    pub username: String,
}

/// One page of players.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../packages/api-types/src/generated/player-page-response.ts"
)]
pub struct PlayerPageResponse {
    pub players: Vec<PlayerListingResponse>,
    pub next_cursor: Option<String>,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            username: entry.username,
            user_id: entry.user_id,
            summit: entry.summit,
        }
    }
}

impl From<LeaderboardView> for LeaderboardResponse {
    fn from(view: LeaderboardView) -> Self {
        Self {
            entries: view.entries.into_iter().map(Into::into).collect(),
            sample_size: view.sample_size,
            computed_at: view.computed_at,
            cached: view.cached,
            cache_age_seconds: view.cache_age_seconds,
        }
    }
}

impl From<PlayerRecord> for PlayerRecordResponse {
    fn from(record: PlayerRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            data: record.value,
        }
    }
}

impl From<NametagRecord> for NametagResponse {
    fn from(record: NametagRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            data: record.value,
        }
    }
}

impl From<PlayerPage> for PlayerPageResponse {
    fn from(page: PlayerPage) -> Self {
        Self {
            players: page
                .players
                .into_iter()
                .map(|player| PlayerListingResponse {
                    user_id: player.user_id,
                    username: player.username,
                })
                .collect(),
            next_cursor: page.next_cursor,
        }
    }
}
