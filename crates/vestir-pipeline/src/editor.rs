//! The generative edit seam.
//!
//! [`ImageEditor`] is the only place the workflow reaches outside the
//! process. Implementations live in other crates (the Gemini client);
//! tests use scripted doubles.

use std::cell::RefCell;

use async_trait::async_trait;
use web_time::Instant;

use crate::pipeline::{EditOutcome, EditTicket, Pipeline};
use crate::types::{EditError, ImagePayload, PipelineError, PipelineStage};

/// Submit images plus one instruction, get one edited image back.
///
/// Implementations issue exactly one request per call. They must not
/// retry on their own: retrying is a user action on the workflow.
///
/// Futures are not required to be `Send` because the browser runs
/// everything on one thread.
#[async_trait(?Send)]
pub trait ImageEditor {
    /// Edit `inputs` according to `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Transport`] if the service cannot be reached,
    /// [`EditError::ContentBlockedOrEmpty`] if it answers without an
    /// image, and [`EditError::Decode`] if the answer is malformed.
    async fn edit(
        &self,
        instruction: &str,
        inputs: &[ImagePayload],
    ) -> Result<ImagePayload, EditError>;
}

/// Run the request described by `ticket` and log how it went.
///
/// # Errors
///
/// Returns whatever the editor returned.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn execute<E: ImageEditor + ?Sized>(
    editor: &E,
    ticket: &EditTicket,
) -> Result<ImagePayload, EditError> {
    let stage = ticket.stage();
    tracing::info!(%stage, inputs = ticket.inputs().len(), "requesting generative edit");
    let started = Instant::now();
    let outcome = editor.edit(ticket.instruction(), ticket.inputs()).await;
    let elapsed_ms = started.elapsed().as_millis();
    match &outcome {
        Ok(payload) => tracing::info!(
            %stage,
            elapsed_ms,
            media_type = %payload.media_type,
            "generative edit succeeded"
        ),
        Err(e) => tracing::warn!(%stage, elapsed_ms, error = %e, "generative edit failed"),
    }
    outcome
}

/// Begin, execute and finish one edit of `stage`.
///
/// The pipeline is only borrowed around the begin and finish steps, so
/// other operations (including a second edit of another stage, or a
/// reset) may run while the request is outstanding.
///
/// # Errors
///
/// Returns the [`PipelineError`] that rejected the edit. Errors from the
/// editor itself are recorded on the stage, not returned.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn run_edit<E: ImageEditor + ?Sized>(
    pipeline: &RefCell<Pipeline>,
    editor: &E,
    stage: PipelineStage,
) -> Result<EditOutcome, PipelineError> {
    let ticket = pipeline.borrow_mut().begin_edit(stage)?;
    let outcome = execute(editor, &ticket).await;
    Ok(pipeline.borrow_mut().finish_edit(ticket, outcome))
}
