//! vestir-gemini: image editing through the Gemini `generateContent` API.
//!
//! [`GeminiClient`] implements [`vestir_pipeline::ImageEditor`]. It sends
//! the stage's images followed by its instruction, asks for an image
//! back, and maps every failure onto [`vestir_pipeline::EditError`]. It
//! never retries on its own.
//!
//! Works on native targets and on `wasm32` (where `reqwest` uses the
//! browser's `fetch`).

pub mod client;
pub mod config;
pub mod wire;

pub use client::GeminiClient;
pub use config::{ConfigError, DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig};
