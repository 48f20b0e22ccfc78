/// Prefix shared by every player record key in the datastore.
const PLAYER_KEY_PREFIX: &str = "Player_";

/// Prefix for nametag entries, which live in their own datastore.
const NAMETAG_KEY_PREFIX: &str = "uid_";

/// Whether the given identifier is a numeric Roblox user id.
#[must_use]
pub fn is_user_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Builds the datastore entry key for a user id.
#[must_use]
pub fn player_entry_key(user_id: &str) -> String {
    format!("{PLAYER_KEY_PREFIX}{user_id}")
}

/// Builds the nametag datastore entry key for a user id.
#[must_use]
pub fn nametag_entry_key(user_id: &str) -> String {
    format!("{NAMETAG_KEY_PREFIX}{user_id}")
}

/// Extracts the user id from a `Player_{id}` entry key.
///
/// Keys that do not follow the convention are returned unchanged so that
/// listings over mixed datastores still surface every entry.
#[must_use]
pub fn user_id_from_entry_key(entry_key: &str) -> &str {
    match entry_key.strip_prefix(PLAYER_KEY_PREFIX) {
        Some(suffix) if is_user_id(suffix) => suffix,
        _ => entry_key,
    }
}
