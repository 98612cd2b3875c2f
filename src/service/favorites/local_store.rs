use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use super::FavoriteSet;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("favorites store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("favorites store parse error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// On-disk favorites for the anonymous session: one JSON file holding an
/// ordered array of ticker strings, the local-storage analog.
#[derive(Debug, Clone)]
pub struct LocalFavoritesStore {
    path: PathBuf,
}

impl LocalFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored set. A missing file is an empty set; an unreadable or
    /// corrupt file degrades to an empty set with a warning.
    pub fn load(&self) -> FavoriteSet {
        match self.try_load() {
            Ok(set) => set,
            Err(StoreError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                FavoriteSet::default()
            }
            Err(err) => {
                warn!(
                    "Failed to load favorites from {}: {err}; starting empty",
                    self.path.display()
                );
                FavoriteSet::default()
            }
        }
    }

    fn try_load(&self) -> Result<FavoriteSet, StoreError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the full set, replacing whatever was stored.
    pub fn save(&self, set: &FavoriteSet) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string(set)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
