//! Infrastructure adapters for Summitdesk: Roblox Open Cloud clients and
//! cache storage.

#![forbid(unsafe_code)]

mod datastore_snapshot_store;
mod in_memory_leaderboard_cache;
mod roblox_datastore_client;
mod roblox_users_client;

pub use datastore_snapshot_store::DataStoreSnapshotStore;
pub use in_memory_leaderboard_cache::InMemoryLeaderboardCache;
pub use roblox_datastore_client::{RobloxDataStoreClient, RobloxDataStoreConfig};
pub use roblox_users_client::RobloxUsersClient;
