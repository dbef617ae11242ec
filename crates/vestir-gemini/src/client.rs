//! HTTP client for the `generateContent` method.

use async_trait::async_trait;
use vestir_pipeline::{EditError, ImageEditor, ImagePayload};

use crate::config::GeminiConfig;
use crate::wire;

/// [`ImageEditor`] backed by the Gemini API.
///
/// One instance may be shared by all stages; it holds no per-request
/// state.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client using `config`.
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    /// Create a client that sends through an existing `reqwest` client.
    #[must_use]
    pub const fn with_http_client(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn send(
        &self,
        api_key: &str,
        body: &wire::GenerateContentRequest,
    ) -> Result<String, EditError> {
        let url = self.config.generate_url();
        let parts = body.contents.first().map_or(0, |c| c.parts.len());
        tracing::debug!(%url, parts, "POST generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| EditError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EditError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(EditError::Transport(wire::describe_failure(
                status.as_u16(),
                &text,
            )));
        }
        Ok(text)
    }
}

#[async_trait(?Send)]
impl ImageEditor for GeminiClient {
    async fn edit(
        &self,
        instruction: &str,
        inputs: &[ImagePayload],
    ) -> Result<ImagePayload, EditError> {
        let Some(api_key) = self.config.api_key() else {
            return Err(EditError::Transport("no API key configured".to_owned()));
        };
        let body = wire::build_request(instruction, inputs);
        let text = self.send(api_key, &body).await?;
        wire::extract_image(wire::parse_response(&text)?)
    }
}
