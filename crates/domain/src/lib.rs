//! Domain types and rules for the Summitdesk datastore proxy.

#![forbid(unsafe_code)]

mod leaderboard;
mod player;

pub use leaderboard::{
    Candidate, LeaderboardEntry, LeaderboardSnapshot, SUMMIT_FIELD_ALIASES, rank_candidates,
    summit_value,
};
pub use player::{is_user_id, nametag_entry_key, player_entry_key, user_id_from_entry_key};
