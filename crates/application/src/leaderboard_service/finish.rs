use std::collections::HashMap;

use chrono::Utc;
use tracing::warn;

use summitdesk_domain::{Candidate, LeaderboardEntry, LeaderboardSnapshot, rank_candidates};

use super::LeaderboardService;

impl LeaderboardService {
    /// Ranks candidates and builds the finished snapshot.
    ///
    /// Display names are resolved only for the post-truncation set; the
    /// full sample can run to thousands of ids. A total resolution failure
    /// degrades every name to the raw user id rather than failing the
    /// snapshot.
    pub(super) async fn finish(
        &self,
        candidates: Vec<Candidate>,
        top_limit: usize,
    ) -> LeaderboardSnapshot {
        let sample_size = candidates.len();
        let top = rank_candidates(candidates, top_limit);

        let user_ids: Vec<String> = top.iter().map(|c| c.user_id.clone()).collect();
        let usernames = match self.names.usernames_for_user_ids(&user_ids).await {
            Ok(usernames) => usernames,
            Err(error) => {
                warn!(%error, "username resolution failed, falling back to user ids");
                HashMap::new()
            }
        };

        let entries = top
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| LeaderboardEntry {
                rank: index as u32 + 1,
                username: usernames
                    .get(&candidate.user_id)
                    .cloned()
                    .unwrap_or_else(|| candidate.user_id.clone()),
                user_id: candidate.user_id,
                summit: candidate.summit,
            })
            .collect();

        LeaderboardSnapshot {
            entries,
            sample_size,
            computed_at: Utc::now(),
        }
    }
}
