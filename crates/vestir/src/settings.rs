//! Persisted client settings.
//!
//! The [`GeminiConfig`] lives as JSON in its own storage slot, next to
//! the album. Unreadable settings fall back to the defaults.

use vestir_gemini::GeminiConfig;
use vestir_pipeline::{KeyValueStore, PersistenceError};

/// Storage key of the settings.
pub const SETTINGS_KEY: &str = "vestir.settings";

/// Read the saved settings, or the defaults.
pub fn load<S: KeyValueStore>(store: &S) -> GeminiConfig {
    let json = match store.get(SETTINGS_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return GeminiConfig::default(),
        Err(e) => {
            tracing::warn!(error = %e, "settings unavailable, using defaults");
            return GeminiConfig::default();
        }
    };
    let config: GeminiConfig = match serde_json::from_str(&json) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "stored settings are corrupt, using defaults");
            return GeminiConfig::default();
        }
    };
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "stored settings are invalid, using defaults");
        return GeminiConfig {
            api_key: config.api_key,
            ..GeminiConfig::default()
        };
    }
    config
}

/// Write `config` to the settings slot.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the store rejects the write.
pub fn save<S: KeyValueStore>(store: &mut S, config: &GeminiConfig) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(config)?;
    store.set(SETTINGS_KEY, &json)
}
