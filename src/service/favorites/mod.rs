use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::service::datasource::FavoritesSource;

pub mod local_store;
pub mod sync;

use local_store::LocalFavoritesStore;

/// Ordered set of starred tickers. Insertion order is preserved because the
/// persisted shape is a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    tickers: Vec<String>,
}

impl FavoriteSet {
    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    /// A copy with the ticker's membership flipped. Toggling twice returns
    /// to the original contents.
    pub fn toggled(&self, ticker: &str) -> FavoriteSet {
        let mut tickers = self.tickers.clone();
        match tickers.iter().position(|t| t == ticker) {
            Some(idx) => {
                tickers.remove(idx);
            }
            None => tickers.push(ticker.to_string()),
        }
        FavoriteSet { tickers }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl From<Vec<String>> for FavoriteSet {
    fn from(tickers: Vec<String>) -> Self {
        Self { tickers }
    }
}

impl FromIterator<String> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tickers: iter.into_iter().collect(),
        }
    }
}

/// Which store is authoritative for the active favorite set. Exactly one at
/// a time; the sets are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Local,
    Remote { identity: String },
}

/// What happens to the active set when the identity goes away.
///
/// The hosted app never handled sign-out at all, so the observed behavior is
/// `KeepSession`; `RevertToLocal` reloads the anonymous on-disk set. Neither
/// policy merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignOutPolicy {
    #[default]
    KeepSession,
    RevertToLocal,
}

/// Maintains the active favorite set across the local and remote stores.
///
/// Remote toggles are optimistic: the in-memory set changes before the
/// network call, and a failed `replace` rolls it back. Every applied change
/// bumps a monotonic sequence number; rollback and session sync only apply
/// when the sequence they observed is still current, so a change that landed
/// in between is never clobbered.
pub struct FavoritesReconciler {
    mode: Mode,
    favorites: FavoriteSet,
    seq: u64,
    local: LocalFavoritesStore,
    remote: Arc<dyn FavoritesSource>,
}

impl FavoritesReconciler {
    /// Start in local mode with whatever the on-disk store holds.
    pub fn new(local: LocalFavoritesStore, remote: Arc<dyn FavoritesSource>) -> Self {
        let favorites = local.load();
        Self {
            mode: Mode::Local,
            favorites,
            seq: 0,
            local,
            remote,
        }
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn is_favorite(&self, ticker: &str) -> bool {
        self.favorites.contains(ticker)
    }

    /// Monotonic change counter, observed by session sync before it suspends.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Identity of the remote store when in remote mode.
    pub fn remote_identity(&self) -> Option<&str> {
        match &self.mode {
            Mode::Remote { identity } => Some(identity),
            Mode::Local => None,
        }
    }

    /// Flip a ticker's membership in the active set.
    ///
    /// Local mode persists the whole set synchronously; a storage failure is
    /// logged and the in-memory set stands. Remote mode applies the change
    /// first and replaces the whole remote set, rolling back on failure.
    /// Failures are not surfaced to the caller.
    pub async fn toggle(&mut self, ticker: &str) {
        let previous = self.favorites.clone();
        self.favorites = self.favorites.toggled(ticker);
        self.seq += 1;
        let applied_seq = self.seq;

        match self.mode.clone() {
            Mode::Local => {
                if let Err(err) = self.local.save(&self.favorites) {
                    warn!("Failed to persist favorites locally: {err}");
                }
            }
            Mode::Remote { identity } => {
                let outgoing = self.favorites.clone();
                if let Err(err) = self.remote.replace(&identity, &outgoing).await {
                    warn!("Remote favorites replace failed for {identity}: {err}");
                    if self.seq == applied_seq {
                        self.favorites = previous;
                        self.seq += 1;
                    } else {
                        debug!("Skipping rollback; a later change superseded the failed toggle");
                    }
                }
            }
        }
    }

    /// Switch to the remote store for `identity`, replacing the in-memory
    /// set wholesale with the fetched one. Rejected when a change landed
    /// after `observed_seq` was read, so a toggle racing the fetch wins over
    /// the stale snapshot. Returns whether the switch happened.
    pub fn adopt_remote(
        &mut self,
        identity: String,
        fetched: FavoriteSet,
        observed_seq: u64,
    ) -> bool {
        if self.seq != observed_seq {
            warn!("Skipping stale favorites sync for {identity}: local changes during fetch");
            return false;
        }

        info!(
            "Switching favorites to remote store for {identity} ({} tickers)",
            fetched.len()
        );
        self.favorites = fetched;
        self.mode = Mode::Remote { identity };
        self.seq += 1;
        true
    }

    /// React to the identity going away, per the configured policy.
    pub fn on_identity_cleared(&mut self, policy: SignOutPolicy) {
        match policy {
            SignOutPolicy::KeepSession => {
                debug!("Identity cleared; keeping the current favorites session");
            }
            SignOutPolicy::RevertToLocal => {
                if self.mode == Mode::Local {
                    return;
                }
                info!("Identity cleared; reverting to local favorites");
                self.favorites = self.local.load();
                self.mode = Mode::Local;
                self.seq += 1;
            }
        }
    }
}
