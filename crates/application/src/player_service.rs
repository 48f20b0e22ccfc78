use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::{is_user_id, player_entry_key, user_id_from_entry_key};

use crate::ports::{DataStoreClient, NameResolver};

/// Maximum keys returned per listing page.
const LIST_PAGE_CAP: u32 = 100;

/// One player record read back from the datastore.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    /// Numeric Roblox user id.
    pub user_id: String,
    /// Identifier the caller addressed the player by.
    pub username: String,
    /// Stored record body; an opaque string when the body was not JSON.
    pub value: Value,
}

/// One row of a player listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerListing {
    /// Numeric Roblox user id.
    pub user_id: String,
    /// Resolved display name, or the user id when resolution failed.
    pub username: String,
}

/// One page of players with the upstream continuation cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPage {
    /// Players in upstream list order.
    pub players: Vec<PlayerListing>,
    /// Cursor for the next page; `None` at end of data.
    pub next_cursor: Option<String>,
}

/// Thin passthrough service for per-player record administration.
///
/// Every operation is one upstream call plus identifier shaping: players
/// are addressed by username or numeric id, records are stored under
/// `Player_{userId}` keys.
#[derive(Clone)]
pub struct PlayerService {
    datastore: Arc<dyn DataStoreClient>,
    names: Arc<dyn NameResolver>,
}

impl PlayerService {
    /// Creates a new player service.
    #[must_use]
    pub fn new(datastore: Arc<dyn DataStoreClient>, names: Arc<dyn NameResolver>) -> Self {
        Self { datastore, names }
    }

    /// Reads one player record addressed by username or user id.
    pub async fn get_player(&self, player: &str) -> AppResult<PlayerRecord> {
        let (user_id, username) = self.resolve_player(player).await?;
        let value = self.datastore.get_entry(&player_entry_key(&user_id)).await?;

        Ok(PlayerRecord {
            user_id,
            username,
            value,
        })
    }

    /// Creates or replaces one player record.
    pub async fn save_player(&self, player: &str, value: Value) -> AppResult<PlayerRecord> {
        let (user_id, username) = self.resolve_player(player).await?;
        self.datastore
            .set_entry(&player_entry_key(&user_id), &value)
            .await?;

        Ok(PlayerRecord {
            user_id,
            username,
            value,
        })
    }

    /// Deletes one player record.
    pub async fn delete_player(&self, player: &str) -> AppResult<String> {
        let (user_id, _) = self.resolve_player(player).await?;
        self.datastore
            .delete_entry(&player_entry_key(&user_id))
            .await?;

        Ok(user_id)
    }

    /// Lists one page of players with display names resolved in bulk.
    pub async fn list_players(
        &self,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> AppResult<PlayerPage> {
        let page_size = limit.unwrap_or(LIST_PAGE_CAP).clamp(1, LIST_PAGE_CAP);
        let page = self.datastore.list_keys(page_size, cursor).await?;

        let user_ids: Vec<String> = page
            .keys
            .iter()
            .map(|key| user_id_from_entry_key(key).to_owned())
            .collect();

        let usernames = match self.names.usernames_for_user_ids(&user_ids).await {
            Ok(usernames) => usernames,
            Err(error) => {
                warn!(%error, "username resolution failed for listing page");
                Default::default()
            }
        };

        let players = user_ids
            .into_iter()
            .map(|user_id| PlayerListing {
                username: usernames
                    .get(&user_id)
                    .cloned()
                    .unwrap_or_else(|| user_id.clone()),
                user_id,
            })
            .collect();

        Ok(PlayerPage {
            players,
            next_cursor: page.next_cursor,
        })
    }

    /// Normalizes a caller-supplied player identifier to a user id.
    ///
    /// Numeric identifiers pass through unchanged; anything else goes
    /// through the username directory and must match exactly.
    async fn resolve_player(&self, player: &str) -> AppResult<(String, String)> {
        let player = player.trim();
        if player.is_empty() {
            return Err(AppError::Validation(
                "player identifier must not be empty".to_owned(),
            ));
        }

        if is_user_id(player) {
            return Ok((player.to_owned(), player.to_owned()));
        }

        let user_id = self.names.user_id_for_username(player).await?;
        Ok((user_id, player.to_owned()))
    }
}
