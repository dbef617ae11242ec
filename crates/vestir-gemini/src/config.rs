//! Client configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base URL of the public Gemini API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Image-capable model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Errors found by [`GeminiConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The endpoint is blank.
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    /// The endpoint is not an http(s) URL.
    #[error("endpoint must start with http:// or https://, got {0}")]
    InvalidEndpoint(String),

    /// The model name is blank.
    #[error("model must not be empty")]
    EmptyModel,
}

/// Where and how to reach the image service.
///
/// Serialized into the settings slot by the web app; the API key is
/// optional there because the user may not have entered one yet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiConfig {
    /// Base URL, without the `/v1beta/...` path.
    pub endpoint: String,
    /// Model name, e.g. [`DEFAULT_MODEL`].
    pub model: String,
    /// API key sent as `x-goog-api-key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }
}

// Keep the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiConfig {
    /// Default endpoint and model with the given key.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// The configured key, if it is non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Full URL of the `generateContent` method.
    #[must_use]
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim().trim_end_matches('/'),
            self.model.trim()
        )
    }

    /// Check that the endpoint and model are usable.
    ///
    /// A missing API key is not a configuration error; requests made
    /// without one fail individually.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_owned()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_without_key() {
        let config = GeminiConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn generate_url_joins_endpoint_and_model() {
        let config = GeminiConfig {
            endpoint: "http://localhost:8080/".into(),
            model: "m".into(),
            api_key: None,
        };
        assert_eq!(
            config.generate_url(),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert_eq!(GeminiConfig::with_api_key("   ").api_key(), None);
        assert_eq!(GeminiConfig::with_api_key(" k ").api_key(), Some("k"));
    }

    #[test]
    fn validation_rejects_bad_endpoint_and_model() {
        let mut config = GeminiConfig::default();
        config.endpoint = " ".into();
        assert_eq!(config.validate(), Err(ConfigError::EmptyEndpoint));
        config.endpoint = "ftp://example.com".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEndpoint(_))
        ));
        config.endpoint = DEFAULT_ENDPOINT.into();
        config.model = String::new();
        assert_eq!(config.validate(), Err(ConfigError::EmptyModel));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let config: GeminiConfig = serde_json::from_str(r#"{"apiKey":"abc"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_key(), Some("abc"));
    }

    #[test]
    fn debug_output_hides_key() {
        let shown = format!("{:?}", GeminiConfig::with_api_key("secret"));
        assert!(!shown.contains("secret"));
    }
}
