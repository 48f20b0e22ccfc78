use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use summitdesk_application::{DataStoreClient, Jitter, SnapshotStore, with_retry};
use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::LeaderboardSnapshot;

/// Entry key the snapshot lives under in its dedicated cache datastore.
const SNAPSHOT_ENTRY_KEY: &str = "top_summits";

/// Durable snapshot persistence backed by a datastore entry.
///
/// The wrapped client must point at the cache datastore, not the player
/// record datastore.
pub struct DataStoreSnapshotStore {
    datastore: Arc<dyn DataStoreClient>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl DataStoreSnapshotStore {
    /// Creates a store over the given cache datastore.
    #[must_use]
    pub fn new(
        datastore: Arc<dyn DataStoreClient>,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> Self {
        Self {
            datastore,
            max_retries,
            retry_base_delay,
        }
    }
}

#[async_trait]
impl SnapshotStore for DataStoreSnapshotStore {
    async fn load(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        let raw = match self.datastore.get_entry(SNAPSHOT_ENTRY_KEY).await {
            Ok(raw) => raw,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(error) => return Err(error),
        };

        // A snapshot written by an older build may no longer deserialize.
        // Treat it like a cold start rather than failing the read.
        match serde_json::from_value(raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(error) => {
                warn!(%error, "persisted snapshot was malformed, ignoring");
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &LeaderboardSnapshot) -> AppResult<()> {
        let value = serde_json::to_value(snapshot)
            .map_err(|error| AppError::Internal(format!("snapshot serialization: {error}")))?;

        let datastore = self.datastore.as_ref();
        let value_ref = &value;
        with_retry(
            self.max_retries,
            self.retry_base_delay,
            Jitter::None,
            move || datastore.set_entry(SNAPSHOT_ENTRY_KEY, value_ref),
        )
        .await
    }
}
