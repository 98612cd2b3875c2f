use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use earnings_board::models::UserRecord;
use earnings_board::service::datasource::{
    DataSourceError, FavoritesSource, UsersSource,
};
use earnings_board::service::favorites::local_store::LocalFavoritesStore;
use earnings_board::service::favorites::sync::SessionSync;
use earnings_board::service::favorites::{FavoriteSet, FavoritesReconciler, SignOutPolicy};

#[derive(Default)]
struct MockRemote {
    sets: Mutex<HashMap<String, Vec<String>>>,
    fail_replace: AtomicBool,
    fail_list: AtomicBool,
    replace_calls: AtomicUsize,
}

impl MockRemote {
    fn with_favorites(identity: &str, tickers: &[&str]) -> Self {
        let remote = Self::default();
        remote.sets.lock().unwrap().insert(
            identity.to_string(),
            tickers.iter().map(|t| t.to_string()).collect(),
        );
        remote
    }

    fn stored(&self, identity: &str) -> Vec<String> {
        self.sets
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl FavoritesSource for MockRemote {
    async fn list(&self, identity: &str) -> Result<FavoriteSet, DataSourceError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DataSourceError::Network("list unavailable".into()));
        }
        Ok(FavoriteSet::from(self.stored(identity)))
    }

    async fn insert(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError> {
        let mut sets = self.sets.lock().unwrap();
        let tickers = sets.entry(identity.to_string()).or_default();
        if !tickers.iter().any(|t| t == ticker) {
            tickers.push(ticker.to_string());
        }
        Ok(())
    }

    async fn delete(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError> {
        let mut sets = self.sets.lock().unwrap();
        if let Some(tickers) = sets.get_mut(identity) {
            tickers.retain(|t| t != ticker);
        }
        Ok(())
    }

    async fn replace(
        &self,
        identity: &str,
        favorites: &FavoriteSet,
    ) -> Result<FavoriteSet, DataSourceError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(DataSourceError::Network("replace unavailable".into()));
        }
        self.sets
            .lock()
            .unwrap()
            .insert(identity.to_string(), favorites.tickers().to_vec());
        Ok(favorites.clone())
    }
}

#[derive(Default)]
struct MockUsers {
    fail: AtomicBool,
    ensure_calls: AtomicUsize,
}

#[async_trait]
impl UsersSource for MockUsers {
    async fn ensure_user(&self, identity: &str) -> Result<UserRecord, DataSourceError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataSourceError::Network("users unavailable".into()));
        }
        Ok(UserRecord {
            user_id: identity.to_string(),
            favorites: Vec::new(),
        })
    }
}

fn temp_store(name: &str) -> LocalFavoritesStore {
    let path: PathBuf = std::env::temp_dir().join(format!(
        "earnings-board-test-{}-{name}.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    LocalFavoritesStore::new(path)
}

fn tickers(set: &FavoriteSet) -> Vec<&str> {
    set.tickers().iter().map(String::as_str).collect()
}

#[tokio::test]
async fn local_toggle_round_trip_and_persistence() {
    let store = temp_store("local-round-trip");
    let remote = Arc::new(MockRemote::default());
    let mut reconciler = FavoritesReconciler::new(store.clone(), remote.clone());

    reconciler.toggle("AAPL").await;
    assert!(reconciler.is_favorite("AAPL"));
    assert_eq!(tickers(&store.load()), vec!["AAPL"]);

    reconciler.toggle("AAPL").await;
    assert!(!reconciler.is_favorite("AAPL"));
    assert!(store.load().is_empty());

    // Local mode never talks to the remote store.
    assert_eq!(remote.replace_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sign_in_replaces_local_set_with_remote() {
    let store = temp_store("sign-in-replaces");
    store.save(&FavoriteSet::from(vec!["AAPL".to_string()])).unwrap();

    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());
    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    assert!(reconciler.is_favorite("AAPL"));

    let mut sync = SessionSync::new(users, remote);
    sync.on_identity_established("user-1", &mut reconciler).await;

    // Remote replaces local wholesale; no merging.
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT"]);
    assert!(!reconciler.is_favorite("AAPL"));
    assert_eq!(reconciler.remote_identity(), Some("user-1"));
}

#[tokio::test]
async fn ensure_user_failure_keeps_local_mode() {
    let store = temp_store("ensure-fails");
    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());
    users.fail.store(true, Ordering::SeqCst);

    let mut reconciler = FavoritesReconciler::new(store.clone(), remote.clone());
    let mut sync = SessionSync::new(users, remote.clone());
    sync.on_identity_established("user-1", &mut reconciler).await;

    assert_eq!(reconciler.remote_identity(), None);

    // Toggles still go to the local store.
    reconciler.toggle("AAPL").await;
    assert_eq!(tickers(&store.load()), vec!["AAPL"]);
    assert_eq!(remote.replace_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_failure_keeps_local_mode() {
    let store = temp_store("fetch-fails");
    let remote = Arc::new(MockRemote::default());
    remote.fail_list.store(true, Ordering::SeqCst);
    let users = Arc::new(MockUsers::default());

    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    let mut sync = SessionSync::new(users, remote);
    sync.on_identity_established("user-1", &mut reconciler).await;

    assert_eq!(reconciler.remote_identity(), None);
}

#[tokio::test]
async fn remote_double_toggle_returns_to_original_set() {
    let store = temp_store("remote-round-trip");
    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());

    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    let mut sync = SessionSync::new(users, remote.clone());
    sync.on_identity_established("user-1", &mut reconciler).await;

    reconciler.toggle("NVDA").await;
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT", "NVDA"]);
    reconciler.toggle("NVDA").await;
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT"]);

    assert_eq!(remote.replace_calls.load(Ordering::SeqCst), 2);
    assert_eq!(remote.stored("user-1"), vec!["MSFT"]);
}

#[tokio::test]
async fn failed_replace_rolls_back_the_optimistic_toggle() {
    let store = temp_store("replace-fails");
    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());

    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    let mut sync = SessionSync::new(users, remote.clone());
    sync.on_identity_established("user-1", &mut reconciler).await;

    remote.fail_replace.store(true, Ordering::SeqCst);
    reconciler.toggle("AAPL").await;

    // In-memory state equals the set before the failed toggle.
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT"]);
    assert_eq!(remote.stored("user-1"), vec!["MSFT"]);
}

#[tokio::test]
async fn stale_fetch_does_not_clobber_a_newer_toggle() {
    let store = temp_store("stale-fetch");
    let remote = Arc::new(MockRemote::default());
    let mut reconciler = FavoritesReconciler::new(store, remote);

    // A sync observes the sequence, then a toggle lands before it applies.
    let observed = reconciler.seq();
    reconciler.toggle("AAPL").await;

    let adopted = reconciler.adopt_remote(
        "user-1".to_string(),
        FavoriteSet::from(vec!["MSFT".to_string()]),
        observed,
    );

    assert!(!adopted);
    assert_eq!(tickers(reconciler.favorites()), vec!["AAPL"]);
    assert_eq!(reconciler.remote_identity(), None);
}

#[tokio::test]
async fn duplicate_sign_in_event_is_a_noop() {
    let store = temp_store("duplicate-sign-in");
    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());

    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    let mut sync = SessionSync::new(users.clone(), remote);

    sync.on_identity_established("user-1", &mut reconciler).await;
    reconciler.toggle("NVDA").await;
    sync.on_identity_established("user-1", &mut reconciler).await;

    // The second event neither re-ensures the record nor clobbers the toggle.
    assert_eq!(users.ensure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT", "NVDA"]);
}

#[tokio::test]
async fn sign_out_policy_controls_reversion() {
    let store = temp_store("sign-out");
    store.save(&FavoriteSet::from(vec!["AAPL".to_string()])).unwrap();

    let remote = Arc::new(MockRemote::with_favorites("user-1", &["MSFT"]));
    let users = Arc::new(MockUsers::default());
    let mut reconciler = FavoritesReconciler::new(store, remote.clone());
    let mut sync = SessionSync::new(users, remote);

    sync.on_identity_established("user-1", &mut reconciler).await;
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT"]);

    // Observed app behavior: the session keeps the remote set.
    sync.on_identity_cleared(&mut reconciler, SignOutPolicy::KeepSession);
    assert_eq!(tickers(reconciler.favorites()), vec!["MSFT"]);
    assert_eq!(reconciler.remote_identity(), Some("user-1"));

    // Explicit policy: drop back to the anonymous local set, no merging.
    sync.on_identity_cleared(&mut reconciler, SignOutPolicy::RevertToLocal);
    assert_eq!(tickers(reconciler.favorites()), vec!["AAPL"]);
    assert_eq!(reconciler.remote_identity(), None);
}
