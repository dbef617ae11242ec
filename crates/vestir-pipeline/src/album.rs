//! Saved try-on results.
//!
//! [`AlbumStore`] keeps an ordered list of [`ImagePayload`]s in memory
//! and rewrites the whole list to its [`KeyValueStore`] after every
//! change. Write failures leave the in-memory list authoritative for the
//! rest of the session and are returned so the caller can warn.

use crate::present::Presenter;
use crate::storage::KeyValueStore;
use crate::types::{ImagePayload, PersistenceError};

/// Storage key of the album.
pub const DEFAULT_ALBUM_KEY: &str = "vestir.album";

/// Ordered, persisted list of saved results.
///
/// Entries have no identity beyond their position. Duplicates are
/// allowed.
#[derive(Debug, Clone)]
pub struct AlbumStore<S> {
    store: S,
    key: String,
    entries: Vec<ImagePayload>,
}

impl<S: KeyValueStore> AlbumStore<S> {
    /// Load the album stored under [`DEFAULT_ALBUM_KEY`].
    ///
    /// Missing, unreadable, or corrupt data loads as an empty album.
    pub fn load(store: S) -> Self {
        Self::load_with_key(store, DEFAULT_ALBUM_KEY)
    }

    /// Load the album stored under `key`.
    pub fn load_with_key(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match store.get(&key) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(%key, error = %e, "stored album is corrupt, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(%key, error = %e, "album storage unavailable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(%key, entries = entries.len(), "album loaded");
        Self {
            store,
            key,
            entries,
        }
    }

    /// Saved entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ImagePayload] {
        &self.entries
    }

    /// Number of saved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the album is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ImagePayload> {
        self.entries.get(index)
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Give back the backing store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Append `payload` and persist the whole album.
    ///
    /// Returns the index of the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the album could not be written.
    /// The entry stays in memory.
    pub fn save(&mut self, payload: ImagePayload) -> Result<usize, PersistenceError> {
        self.entries.push(payload);
        let index = self.entries.len() - 1;
        self.persist()?;
        Ok(index)
    }

    /// Remove the entry at `index` and persist the whole album.
    ///
    /// An out-of-range index is a no-op and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the album could not be written.
    /// The entry stays removed from memory.
    pub fn remove(&mut self, index: usize) -> Result<Option<ImagePayload>, PersistenceError> {
        if index >= self.entries.len() {
            tracing::debug!(index, len = self.entries.len(), "ignoring stale album removal");
            return Ok(None);
        }
        let removed = self.entries.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(&self.entries)?;
        self.store.set(&self.key, &json).inspect_err(|e| {
            tracing::warn!(key = %self.key, error = %e, "failed to persist album");
        })
    }

    /// Emit the album to `presenter`.
    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        presenter.render_album(&self.entries);
    }
}
