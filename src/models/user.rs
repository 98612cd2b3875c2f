use serde::{Deserialize, Serialize};

/// Per-identity record in the hosted users table.
///
/// `ensure_user` returns this unchanged when the record already exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "clerk_id")]
    pub user_id: String,
    #[serde(default)]
    pub favorites: Vec<String>,
}
