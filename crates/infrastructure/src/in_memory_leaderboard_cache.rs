use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use summitdesk_application::LeaderboardCache;
use summitdesk_core::AppResult;
use summitdesk_domain::LeaderboardSnapshot;

/// Process-local single-slot snapshot cache with TTL-gated reads.
pub struct InMemoryLeaderboardCache {
    ttl: Duration,
    slot: RwLock<Option<LeaderboardSnapshot>>,
}

impl InMemoryLeaderboardCache {
    /// Creates an empty cache whose reads expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }
}

#[async_trait]
impl LeaderboardCache for InMemoryLeaderboardCache {
    async fn read(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        let slot = self.slot.read().await;
        Ok(slot
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh(Utc::now(), self.ttl))
            .cloned())
    }

    async fn force_read(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        Ok(self.slot.read().await.clone())
    }

    async fn write(&self, snapshot: LeaderboardSnapshot) -> AppResult<()> {
        *self.slot.write().await = Some(snapshot);
        Ok(())
    }
}
