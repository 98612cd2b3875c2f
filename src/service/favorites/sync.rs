use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::service::datasource::{FavoritesSource, UsersSource};

use super::{FavoritesReconciler, SignOutPolicy};

/// Promotes a session from local to remote favorites when an identity is
/// established.
///
/// The two steps are sequenced: the user record is ensured first, then the
/// stored favorites are fetched. Either failure leaves the reconciler in
/// local mode (fail-safe). The reconciler is only touched after both network
/// calls resolve, guarded by the sequence number read before suspending.
pub struct SessionSync {
    users: Arc<dyn UsersSource>,
    favorites: Arc<dyn FavoritesSource>,
    synced_identity: Option<String>,
}

impl SessionSync {
    pub fn new(users: Arc<dyn UsersSource>, favorites: Arc<dyn FavoritesSource>) -> Self {
        Self {
            users,
            favorites,
            synced_identity: None,
        }
    }

    /// Handle an anonymous -> signed-in transition. Safe to call again for
    /// the same identity: a duplicate event is a no-op and never re-creates
    /// the user record or clobbers the synced set.
    pub async fn on_identity_established(
        &mut self,
        identity: &str,
        reconciler: &mut FavoritesReconciler,
    ) {
        if self.synced_identity.as_deref() == Some(identity) {
            debug!("Favorites already synced for {identity}; ignoring duplicate sign-in event");
            return;
        }

        let observed_seq = reconciler.seq();

        match self.users.ensure_user(identity).await {
            Ok(record) => {
                debug!("User record in place for {}", record.user_id);
            }
            Err(err) => {
                warn!(
                    "Failed to ensure user record for {identity}: {err}; staying on local favorites"
                );
                return;
            }
        }

        match self.favorites.list(identity).await {
            Ok(fetched) => {
                if reconciler.adopt_remote(identity.to_string(), fetched, observed_seq) {
                    info!("Favorites synced from remote store for {identity}");
                    self.synced_identity = Some(identity.to_string());
                }
            }
            Err(err) => {
                warn!(
                    "Failed to fetch remote favorites for {identity}: {err}; staying on local favorites"
                );
            }
        }
    }

    /// Handle a signed-in -> anonymous transition per the configured policy,
    /// and allow a later sign-in to sync again.
    pub fn on_identity_cleared(
        &mut self,
        reconciler: &mut FavoritesReconciler,
        policy: SignOutPolicy,
    ) {
        self.synced_identity = None;
        reconciler.on_identity_cleared(policy);
    }
}
