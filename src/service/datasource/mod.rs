use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EarningEntry, UserRecord};
use crate::service::favorites::FavoriteSet;

pub mod http;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

/// Read side of the hosted earnings feed.
#[async_trait]
pub trait EntriesSource: Send + Sync {
    /// Fetch the flat entry list. With an identity the server joins each
    /// entry against that user's stored favorites and fills `isStarred`.
    async fn fetch_entries(
        &self,
        identity: Option<&str>,
    ) -> Result<Vec<EarningEntry>, DataSourceError>;
}

/// Per-identity favorites store.
///
/// `insert`/`delete` are idempotent: re-inserting a present ticker or
/// deleting an absent one is a success, not an error. `replace` is
/// last-writer-wins; concurrent replaces from two sessions of the same
/// identity can clobber each other, accepted for low-stakes preference data.
#[async_trait]
pub trait FavoritesSource: Send + Sync {
    async fn list(&self, identity: &str) -> Result<FavoriteSet, DataSourceError>;
    async fn insert(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError>;
    async fn delete(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError>;
    async fn replace(
        &self,
        identity: &str,
        favorites: &FavoriteSet,
    ) -> Result<FavoriteSet, DataSourceError>;
}

/// Per-identity user record, create-if-absent.
#[async_trait]
pub trait UsersSource: Send + Sync {
    async fn ensure_user(&self, identity: &str) -> Result<UserRecord, DataSourceError>;
}

/// Collapse a duplicate-key conflict into success, per the idempotency
/// contract on insert/delete.
pub(crate) fn squash_conflict(
    result: Result<(), DataSourceError>,
) -> Result<(), DataSourceError> {
    match result {
        Err(DataSourceError::Conflict(detail)) => {
            tracing::debug!("Treating duplicate write as success: {detail}");
            Ok(())
        }
        other => other,
    }
}
