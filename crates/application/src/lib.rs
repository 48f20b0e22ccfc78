//! Application services and ports for the Summitdesk datastore proxy.

#![forbid(unsafe_code)]

mod leaderboard_service;
mod nametag_service;
mod player_service;
mod ports;

pub use leaderboard_service::{
    Jitter, LeaderboardConfig, LeaderboardQuery, LeaderboardService, LeaderboardView, with_retry,
};
pub use nametag_service::{NametagRecord, NametagService};
pub use player_service::{PlayerListing, PlayerPage, PlayerRecord, PlayerService};
pub use ports::{DataStoreClient, KeyListPage, LeaderboardCache, NameResolver, SnapshotStore};
