use std::sync::Arc;

use serde_json::Value;

use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::{is_user_id, nametag_entry_key};

use crate::ports::{DataStoreClient, NameResolver};

/// One nametag prefix record read back from its datastore.
#[derive(Debug, Clone, PartialEq)]
pub struct NametagRecord {
    /// Numeric Roblox user id.
    pub user_id: String,
    /// Identifier the caller addressed the player by.
    pub username: String,
    /// Stored nametag body.
    pub value: Value,
}

/// Per-player nametag prefix administration.
///
/// Nametags live in their own datastore under `uid_{userId}` keys; the
/// injected datastore client must point there, not at the player records.
#[derive(Clone)]
pub struct NametagService {
    datastore: Arc<dyn DataStoreClient>,
    names: Arc<dyn NameResolver>,
}

impl NametagService {
    /// Creates a new nametag service.
    #[must_use]
    pub fn new(datastore: Arc<dyn DataStoreClient>, names: Arc<dyn NameResolver>) -> Self {
        Self { datastore, names }
    }

    /// Reads one nametag addressed by username or user id.
    pub async fn get_nametag(&self, player: &str) -> AppResult<NametagRecord> {
        let (user_id, username) = self.resolve_player(player).await?;
        let value = self
            .datastore
            .get_entry(&nametag_entry_key(&user_id))
            .await?;

        Ok(NametagRecord {
            user_id,
            username,
            value,
        })
    }

    /// Creates or replaces one nametag after shape validation.
    pub async fn save_nametag(&self, player: &str, value: Value) -> AppResult<NametagRecord> {
        validate_nametag(&value)?;

        let (user_id, username) = self.resolve_player(player).await?;
        self.datastore
            .set_entry(&nametag_entry_key(&user_id), &value)
            .await?;

        Ok(NametagRecord {
            user_id,
            username,
            value,
        })
    }

    /// Deletes one nametag.
    pub async fn delete_nametag(&self, player: &str) -> AppResult<String> {
        let (user_id, _) = self.resolve_player(player).await?;
        self.datastore
            .delete_entry(&nametag_entry_key(&user_id))
            .await?;

        Ok(user_id)
    }

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

/// Checks the nametag shape the game expects: a `text` field plus a
/// `color` object carrying `r`, `g` and `b`.
fn validate_nametag(value: &Value) -> AppResult<()> {
    let Some(fields) = value.as_object() else {
        return Err(AppError::Validation(
            "nametag data must be an object".to_owned(),
        ));
    };

    if !fields.contains_key("text") {
        return Err(AppError::Validation(
            "nametag data must contain a 'text' field".to_owned(),
        ));
    }

    let Some(color) = fields.get("color").and_then(Value::as_object) else {
        return Err(AppError::Validation(
            "nametag data must contain a 'color' object".to_owned(),
        ));
    };

    for channel in ["r", "g", "b"] {
        if !color.contains_key(channel) {
            return Err(AppError::Validation(format!(
                "nametag color must contain an '{channel}' value"
            )));
        }
    }

    Ok(())
}
