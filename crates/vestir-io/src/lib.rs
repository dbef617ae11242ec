//! vestir-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, Blob downloads and `localStorage` persistence,
//! turns presenter commands into a render model, and provides the UI
//! components of the vestir web application.

pub mod components;
pub mod download;
pub mod stage;
pub mod storage;
pub mod view;

pub use components::{Album, FileUpload, StagePanel};
pub use storage::LocalStorage;
pub use view::{StageView, WorkflowView};
