//! vestir-pipeline: Guided virtual try-on workflow (sans-IO).
//!
//! Walks a user through five stages:
//! upload model -> clean model -> upload outfit -> isolate outfit -> try on.
//!
//! This crate has **no I/O dependencies**. The generative image service
//! is reached through the [`ImageEditor`] trait, persistence through
//! [`KeyValueStore`], and rendering through [`Presenter`]. Browser
//! bindings live in `vestir-io`, the HTTP client in `vestir-gemini`.

pub mod album;
pub mod codec;
pub mod editor;
pub mod pipeline;
pub mod present;
pub mod prompts;
pub mod session;
pub mod storage;
pub mod types;

pub use album::{AlbumStore, DEFAULT_ALBUM_KEY};
pub use editor::{ImageEditor, execute, run_edit};
pub use pipeline::{
    Download, EditOutcome, EditTicket, Pipeline, StagePhase, StageSlot, download_name,
    stage_controls,
};
pub use present::{Action, Control, Intent, Presenter};
pub use session::{Effect, Session};
pub use storage::{KeyValueStore, MemoryStore};
pub use types::{
    CodecError, EditError, ImagePayload, PersistenceError, PipelineError, PipelineStage,
    SourceFile, StageStatus,
};
