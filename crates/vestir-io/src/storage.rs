//! `window.localStorage` as a [`KeyValueStore`].
//!
//! Private browsing modes and sandboxed iframes may deny access to
//! `localStorage` entirely. [`LocalStorage::new`] never fails; every
//! operation on an unavailable store returns
//! [`PersistenceError::Unavailable`] so the album falls back to an
//! in-memory session.

use vestir_pipeline::{KeyValueStore, PersistenceError};
use wasm_bindgen::JsValue;

/// Handle to the page's `localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    /// Open `localStorage` of the current window, if it is accessible.
    #[must_use]
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage is not available; saved results will not persist");
        }
        Self { storage }
    }

    /// Whether the browser granted access.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&web_sys::Storage, PersistenceError> {
        self.storage
            .as_ref()
            .ok_or_else(|| PersistenceError::Unavailable("localStorage is not accessible".into()))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage()?.get_item(key).map_err(|e| classify(&e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage()?.set_item(key, value).map_err(|e| classify(&e))
    }
}

/// Map a thrown `DOMException` onto a [`PersistenceError`].
fn classify(error: &JsValue) -> PersistenceError {
    let text = format!("{error:?}");
    if is_quota_error(&text) {
        PersistenceError::QuotaExceeded
    } else {
        PersistenceError::Unavailable(text)
    }
}

/// Browsers disagree on the exception name; Firefox used its own.
fn is_quota_error(text: &str) -> bool {
    text.contains("QuotaExceededError") || text.contains("NS_ERROR_DOM_QUOTA_REACHED")
}
