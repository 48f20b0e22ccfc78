use std::sync::Arc;

use summitdesk_application::{LeaderboardService, NametagService, PlayerService};

use crate::sessions::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub leaderboard_service: LeaderboardService,
    pub player_service: PlayerService,
    pub nametag_service: NametagService,
    pub sessions: Arc<SessionStore>,
    pub admin_password: String,
}
