use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered precedence list for the numeric ranking field.
///
/// Player records were written by several game versions that disagreed on
/// the field name. The first alias present in the record wins; later
/// aliases are ignored even when the winning value fails numeric coercion.
pub const SUMMIT_FIELD_ALIASES: [&str; 6] = [
    "summit",
    "summits",
    "bestSummit",
    "highestSummit",
    "Summits",
    "Summit",
];

/// Extracts the summit count from a raw player record.
///
/// Non-object records and records without any known alias score 0, which
/// keeps them off the board.
#[must_use]
pub fn summit_value(record: &Value) -> f64 {
    let Some(fields) = record.as_object() else {
        return 0.0;
    };

    for alias in SUMMIT_FIELD_ALIASES {
        if let Some(value) = fields.get(alias) {
            return coerce_number(value);
        }
    }

    0.0
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// A sampled player record with its extracted summit count, prior to
/// top-N truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Numeric Roblox user id as stored in the entry key.
    pub user_id: String,
    /// Extracted ranking value, always positive for retained candidates.
    pub summit: f64,
    /// Raw record body the value was extracted from.
    pub raw: Value,
}

/// One ranked row of a finished leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position after the final sort.
    pub rank: u32,
    /// Resolved display name, or the raw user id when resolution failed.
    pub username: String,
    /// Numeric Roblox user id.
    pub user_id: String,
    /// Summit count the entry was ranked by.
    pub summit: f64,
}

/// The finalized, ranked, name-resolved leaderboard result.
///
/// Immutable once built; the cache replaces whole snapshots, never rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    /// Entries sorted strictly descending by summit count.
    pub entries: Vec<LeaderboardEntry>,
    /// Number of candidates the sample produced before truncation.
    pub sample_size: usize,
    /// Instant the snapshot was computed.
    pub computed_at: DateTime<Utc>,
}

impl LeaderboardSnapshot {
    /// Snapshot age in whole seconds at `now`. Never negative.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.computed_at).num_seconds().max(0) as u64
    }

    /// Whether the snapshot is still within its time-to-live at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        now - self.computed_at < ttl
    }
}

/// Sorts candidates descending by summit count and keeps the top
/// `top_limit`.
///
/// The sort is stable: candidates with equal counts keep their discovery
/// order, so upstream list order is the tiebreak.
#[must_use]
pub fn rank_candidates(mut candidates: Vec<Candidate>, top_limit: usize) -> Vec<Candidate> {
    candidates.sort_by(|left, right| {
        right
            .summit
            .partial_cmp(&left.summit)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(top_limit);
    candidates
}
