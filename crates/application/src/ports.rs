use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use summitdesk_core::AppResult;
use summitdesk_domain::LeaderboardSnapshot;

/// One page of datastore entry keys in upstream list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyListPage {
    /// Raw entry keys, e.g. `Player_261`.
    pub keys: Vec<String>,
    /// Opaque pagination cursor; `None` signals end of data.
    pub next_cursor: Option<String>,
}

/// Port for one scoped key-value datastore upstream.
///
/// Adapters map upstream failures onto the `AppError` taxonomy: missing
/// entries become `NotFound`, HTTP 429 becomes `RateLimited`, malformed
/// record bodies are returned as opaque `Value::String` rather than
/// failing the read.
#[async_trait]
pub trait DataStoreClient: Send + Sync {
    /// Lists one page of entry keys starting at `cursor`.
    async fn list_keys(&self, page_size: u32, cursor: Option<&str>) -> AppResult<KeyListPage>;

    /// Reads one entry.
    async fn get_entry(&self, key: &str) -> AppResult<Value>;

    /// Creates or replaces one entry.
    async fn set_entry(&self, key: &str, value: &Value) -> AppResult<()>;

    /// Deletes one entry.
    async fn delete_entry(&self, key: &str) -> AppResult<()>;
}

/// Port for the external username directory.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolves a username to its numeric user id. Exact match required.
    async fn user_id_for_username(&self, username: &str) -> AppResult<String>;

    /// Resolves user ids to display names in bulk.
    ///
    /// Partial results are allowed; callers fall back to the raw id for
    /// absent entries.
    async fn usernames_for_user_ids(
        &self,
        user_ids: &[String],
    ) -> AppResult<HashMap<String, String>>;
}

/// Port for the single process-wide leaderboard cache slot.
///
/// The leaderboard service is the only writer; snapshots are replaced as a
/// unit so readers never observe a half-built result.
#[async_trait]
pub trait LeaderboardCache: Send + Sync {
    /// Returns the cached snapshot if it is still within its TTL.
    /// Never blocks on a refresh and never triggers one.
    async fn read(&self) -> AppResult<Option<LeaderboardSnapshot>>;

    /// Returns the cached snapshot regardless of age.
    async fn force_read(&self) -> AppResult<Option<LeaderboardSnapshot>>;

    /// Replaces the cached snapshot.
    async fn write(&self, snapshot: LeaderboardSnapshot) -> AppResult<()>;
}

/// Port for durable snapshot persistence across process restarts.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the last persisted snapshot, however old.
    async fn load(&self) -> AppResult<Option<LeaderboardSnapshot>>;

    /// Persists one snapshot.
    async fn save(&self, snapshot: &LeaderboardSnapshot) -> AppResult<()>;
}
