//! Dioxus UI components for vestir.
//!
//! Provides the file upload drop zone, the per-stage panel and the
//! album strip.

mod album;
mod stage_panel;
mod upload;

pub use album::Album;
pub use stage_panel::StagePanel;
pub use upload::FileUpload;
