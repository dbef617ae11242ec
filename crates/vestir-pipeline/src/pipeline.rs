//! The five-stage try-on workflow.
//!
//! [`Pipeline`] owns one [`StageSlot`] per [`PipelineStage`] and
//! enforces the linear order:
//!
//! ```text
//! ModelUpload -> ModelClean -> OutfitUpload -> OutfitIsolate -> Combine
//!                                   ^                              |
//!                                   +---- try another outfit ------+
//! ```
//!
//! Upload stages complete as soon as their file is encoded. Edit stages
//! complete only when a successful result is approved; approving copies
//! the result forward into the next stage's inputs.
//!
//! Generative calls are split into [`Pipeline::begin_edit`] and
//! [`Pipeline::finish_edit`] so that nothing is borrowed while the
//! request is outstanding. Every begin and every reset bumps the stage's
//! generation; a ticket from an older generation is discarded when it
//! finishes, so a slow response can never overwrite a newer one.
//!
//! ```rust
//! # use vestir_pipeline::{Pipeline, PipelineStage, SourceFile, ImagePayload, EditOutcome};
//! # fn run() -> Result<(), vestir_pipeline::PipelineError> {
//! let mut pipeline = Pipeline::new();
//! let photo = SourceFile::new("me.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]);
//! pipeline.upload(PipelineStage::ModelUpload, &photo)?;
//!
//! let ticket = pipeline.begin_edit(PipelineStage::ModelClean)?;
//! // ... send ticket.instruction() and ticket.inputs() to the service ...
//! let edited = ImagePayload::new("AAAA", "image/png");
//! assert_eq!(pipeline.finish_edit(ticket, Ok(edited)), EditOutcome::Succeeded);
//!
//! pipeline.approve(PipelineStage::ModelClean)?;
//! assert_eq!(pipeline.active(), PipelineStage::OutfitUpload);
//! # Ok(())
//! # }
//! ```

use web_time::{SystemTime, UNIX_EPOCH};

use crate::album::AlbumStore;
use crate::codec;
use crate::present::{Action, Control, Presenter};
use crate::prompts;
use crate::storage::KeyValueStore;
use crate::types::{EditError, ImagePayload, PipelineError, PipelineStage, SourceFile, StageStatus};

/// Working memory of one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSlot {
    inputs: Vec<ImagePayload>,
    output: Option<ImagePayload>,
    source_name: Option<String>,
    status: StageStatus,
    error: Option<String>,
    completed: bool,
    generation: u64,
}

impl StageSlot {
    /// Payloads copied in from earlier stages when this stage was activated.
    #[must_use]
    pub fn inputs(&self) -> &[ImagePayload] {
        &self.inputs
    }

    /// The uploaded image (upload stages) or the latest edited image.
    #[must_use]
    pub const fn output(&self) -> Option<&ImagePayload> {
        self.output.as_ref()
    }

    /// Name of the file the user picked, for upload stages.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Current sub-status.
    #[must_use]
    pub const fn status(&self) -> StageStatus {
        self.status
    }

    /// Error text of the last failed attempt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the stage has been completed (uploaded or approved).
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Empty the slot, keeping the generation moving forward.
    fn clear(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }
}

/// Where a stage sits relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagePhase {
    /// Not reachable yet.
    Pending,
    /// The stage the user is working on.
    Active,
    /// Uploaded or approved.
    Completed,
}

/// A generative request handed out by [`Pipeline::begin_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an edit ticket must be passed back to finish_edit"]
pub struct EditTicket {
    stage: PipelineStage,
    generation: u64,
    instruction: &'static str,
    inputs: Vec<ImagePayload>,
}

impl EditTicket {
    /// Stage the request belongs to.
    #[must_use]
    pub const fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Fixed instruction text for the stage.
    #[must_use]
    pub const fn instruction(&self) -> &'static str {
        self.instruction
    }

    /// Input images, in request order.
    #[must_use]
    pub fn inputs(&self) -> &[ImagePayload] {
        &self.inputs
    }
}

/// What [`Pipeline::finish_edit`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The image was stored and the stage is `Succeeded`.
    Succeeded,
    /// The error was recorded and the stage is `Failed`.
    Failed,
    /// The ticket was superseded; nothing changed.
    Discarded,
}

/// An image offered to the user for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Image to save.
    pub payload: ImagePayload,
    /// Suggested file name, including extension.
    pub filename: String,
}

/// Suggested download file name for an image of `stage`.
#[must_use]
pub fn download_name(stage: PipelineStage, payload: &ImagePayload, unix_millis: u128) -> String {
    format!(
        "vestir-{}-{unix_millis}.{}",
        stage.slug(),
        payload.file_extension()
    )
}

/// Milliseconds since the Unix epoch, or zero if the clock is broken.
pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Stages whose accepted output feeds `stage`, in request order.
const fn input_sources(stage: PipelineStage) -> &'static [PipelineStage] {
    match stage {
        PipelineStage::ModelClean => &[PipelineStage::ModelUpload],
        PipelineStage::OutfitIsolate => &[PipelineStage::OutfitUpload],
        PipelineStage::Combine => &[PipelineStage::ModelClean, PipelineStage::OutfitIsolate],
        PipelineStage::ModelUpload | PipelineStage::OutfitUpload => &[],
    }
}

/// Controls each stage shows, in display order.
#[must_use]
pub const fn stage_controls(stage: PipelineStage) -> &'static [Control] {
    match stage {
        PipelineStage::ModelUpload | PipelineStage::OutfitUpload => {
            &[Control::FilePicker, Control::Action(Action::Download)]
        }
        PipelineStage::ModelClean | PipelineStage::OutfitIsolate => &[
            Control::Action(Action::Run),
            Control::Action(Action::Retry),
            Control::Action(Action::Approve),
            Control::Action(Action::Download),
        ],
        PipelineStage::Combine => &[
            Control::Action(Action::Run),
            Control::Action(Action::Retry),
            Control::Action(Action::Approve),
            Control::Action(Action::Download),
            Control::Action(Action::SaveToAlbum),
            Control::Action(Action::TryAnotherOutfit),
        ],
    }
}

/// The try-on workflow state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    slots: [StageSlot; 5],
    active: PipelineStage,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// A fresh workflow with every slot empty and the model upload active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            active: PipelineStage::ModelUpload,
        }
    }

    /// The stage the user is working on.
    #[must_use]
    pub const fn active(&self) -> PipelineStage {
        self.active
    }

    /// Working memory of `stage`.
    #[must_use]
    pub const fn slot(&self, stage: PipelineStage) -> &StageSlot {
        &self.slots[stage.index()]
    }

    const fn slot_mut(&mut self, stage: PipelineStage) -> &mut StageSlot {
        &mut self.slots[stage.index()]
    }

    /// Sub-status of `stage`.
    #[must_use]
    pub const fn status(&self, stage: PipelineStage) -> StageStatus {
        self.slot(stage).status
    }

    /// Latest image held by `stage`.
    #[must_use]
    pub const fn output(&self, stage: PipelineStage) -> Option<&ImagePayload> {
        self.slot(stage).output()
    }

    /// Where `stage` sits relative to the active stage.
    #[must_use]
    pub const fn phase(&self, stage: PipelineStage) -> StagePhase {
        if self.slot(stage).completed {
            StagePhase::Completed
        } else if stage.index() == self.active.index() {
            StagePhase::Active
        } else {
            StagePhase::Pending
        }
    }

    /// Whether the final result has been approved.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.slot(PipelineStage::Combine).completed
    }

    fn ensure_active(&self, stage: PipelineStage) -> Result<(), PipelineError> {
        if stage != self.active {
            return Err(PipelineError::NotActive {
                stage,
                active: self.active,
            });
        }
        if self.slot(stage).completed {
            return Err(PipelineError::AlreadyCompleted(stage));
        }
        Ok(())
    }

    fn inputs_ready(&self, stage: PipelineStage) -> bool {
        let slot = self.slot(stage);
        slot.inputs.len() == input_sources(stage).len()
    }

    /// Make `stage` active, copying the accepted outputs it depends on.
    fn activate(&mut self, stage: PipelineStage) {
        let inputs: Vec<ImagePayload> = input_sources(stage)
            .iter()
            .filter_map(|&source| self.slot(source).output.clone())
            .collect();
        tracing::debug!(%stage, inputs = inputs.len(), "activating stage");
        self.active = stage;
        self.slot_mut(stage).inputs = inputs;
    }

    /// Complete `stage` and move on to the next one, if any.
    fn complete(&mut self, stage: PipelineStage) {
        self.slot_mut(stage).completed = true;
        if let Some(next) = stage.next() {
            self.activate(next);
        } else {
            tracing::debug!("workflow finished");
        }
    }

    /// Encode `file` as the image for an upload stage.
    ///
    /// On success the upload stage completes and the following edit
    /// stage becomes active. On failure the stage is marked `Failed`
    /// with the error text and stays active so another file can be
    /// chosen.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotUploadStage`] for edit stages,
    /// [`PipelineError::NotActive`] / [`PipelineError::AlreadyCompleted`]
    /// if the stage is not the one being worked on, and
    /// [`PipelineError::Codec`] if the file cannot be encoded.
    pub fn upload(&mut self, stage: PipelineStage, file: &SourceFile) -> Result<(), PipelineError> {
        if !stage.is_upload() {
            return Err(PipelineError::NotUploadStage(stage));
        }
        self.ensure_active(stage)?;

        match codec::encode(file) {
            Ok(payload) => {
                tracing::debug!(
                    %stage,
                    name = %file.name,
                    media_type = %payload.media_type,
                    "file encoded"
                );
                let slot = self.slot_mut(stage);
                slot.output = Some(payload);
                slot.source_name = Some(file.name.clone());
                slot.status = StageStatus::Succeeded;
                slot.error = None;
                self.complete(stage);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%stage, name = %file.name, error = %e, "file rejected");
                let slot = self.slot_mut(stage);
                slot.status = StageStatus::Failed;
                slot.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Start a generative edit of `stage`.
    ///
    /// Valid while the stage is active, not completed, not already in
    /// flight, and all of its inputs are present. Marks the stage
    /// `InFlight` and returns the request to send.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotEditStage`] for upload stages,
    /// [`PipelineError::MissingInput`] if an input is empty,
    /// [`PipelineError::NotActive`] / [`PipelineError::AlreadyCompleted`]
    /// if the stage is not the one being worked on, and
    /// [`PipelineError::InFlight`] if a request is outstanding.
    pub fn begin_edit(&mut self, stage: PipelineStage) -> Result<EditTicket, PipelineError> {
        let Some(instruction) = prompts::instruction(stage) else {
            return Err(PipelineError::NotEditStage(stage));
        };
        if !self.inputs_ready(stage) {
            return Err(PipelineError::MissingInput(stage));
        }
        self.ensure_active(stage)?;
        if self.status(stage) == StageStatus::InFlight {
            return Err(PipelineError::InFlight(stage));
        }

        let slot = self.slot_mut(stage);
        slot.generation += 1;
        slot.status = StageStatus::InFlight;
        slot.error = None;
        tracing::debug!(%stage, generation = slot.generation, "edit started");

        Ok(EditTicket {
            stage,
            generation: slot.generation,
            instruction,
            inputs: slot.inputs.clone(),
        })
    }

    /// Record the result of a request started by [`begin_edit`](Self::begin_edit).
    ///
    /// A success overwrites any earlier output. If the stage has moved
    /// on since the ticket was issued (a newer request, a reset) the
    /// result is dropped and [`EditOutcome::Discarded`] is returned.
    pub fn finish_edit(
        &mut self,
        ticket: EditTicket,
        outcome: Result<ImagePayload, EditError>,
    ) -> EditOutcome {
        let stage = ticket.stage;
        let slot = self.slot_mut(stage);
        if slot.status != StageStatus::InFlight || slot.generation != ticket.generation {
            tracing::debug!(
                %stage,
                ticket = ticket.generation,
                current = slot.generation,
                "discarding superseded edit result"
            );
            return EditOutcome::Discarded;
        }

        match outcome {
            Ok(payload) => {
                slot.output = Some(payload);
                slot.status = StageStatus::Succeeded;
                slot.error = None;
                EditOutcome::Succeeded
            }
            Err(e) => {
                // Keep the previous output visible if one exists.
                slot.status = StageStatus::Failed;
                slot.error = Some(e.to_string());
                EditOutcome::Failed
            }
        }
    }

    /// Accept the current result of an edit stage and move on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotEditStage`] for upload stages,
    /// [`PipelineError::NotActive`] / [`PipelineError::AlreadyCompleted`]
    /// if the stage is not the one being worked on, and
    /// [`PipelineError::NotSucceeded`] unless the last attempt succeeded.
    pub fn approve(&mut self, stage: PipelineStage) -> Result<(), PipelineError> {
        if !stage.is_edit() {
            return Err(PipelineError::NotEditStage(stage));
        }
        self.ensure_active(stage)?;
        if self.status(stage) != StageStatus::Succeeded {
            return Err(PipelineError::NotSucceeded(stage));
        }
        tracing::debug!(%stage, "stage approved");
        self.complete(stage);
        Ok(())
    }

    /// Go back to the outfit upload, keeping the cleaned model.
    ///
    /// Clears the outfit upload, outfit isolation and combine slots,
    /// including their error text. Outstanding requests for those stages
    /// are discarded when they resolve.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotAtCombine`] unless the combine stage
    /// is active or completed.
    pub fn restart_outfit(&mut self) -> Result<(), PipelineError> {
        if self.active != PipelineStage::Combine {
            return Err(PipelineError::NotAtCombine);
        }
        for stage in [
            PipelineStage::OutfitUpload,
            PipelineStage::OutfitIsolate,
            PipelineStage::Combine,
        ] {
            self.slot_mut(stage).clear();
        }
        tracing::debug!("restarting from the outfit upload");
        self.activate(PipelineStage::OutfitUpload);
        Ok(())
    }

    /// Start over from the model upload.
    pub fn reset(&mut self) {
        for stage in PipelineStage::ALL {
            self.slot_mut(stage).clear();
        }
        tracing::debug!("workflow reset");
        self.activate(PipelineStage::ModelUpload);
    }

    /// Offer the image held by `stage` for saving.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoOutput`] if the stage holds no image.
    pub fn download(&self, stage: PipelineStage) -> Result<Download, PipelineError> {
        let payload = self
            .output(stage)
            .cloned()
            .ok_or(PipelineError::NoOutput(stage))?;
        let filename = download_name(stage, &payload, unix_millis());
        Ok(Download { payload, filename })
    }

    /// Copy the final result into `album`.
    ///
    /// Returns the index of the new album entry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotSucceeded`] unless the combine stage
    /// holds a successful result, and [`PipelineError::Persistence`] if
    /// the album could not be written (the entry is still kept in memory).
    pub fn save_result<S: KeyValueStore>(
        &self,
        album: &mut AlbumStore<S>,
    ) -> Result<usize, PipelineError> {
        let stage = PipelineStage::Combine;
        let payload = match (self.status(stage), self.output(stage)) {
            (StageStatus::Succeeded, Some(payload)) => payload.clone(),
            _ => return Err(PipelineError::NotSucceeded(stage)),
        };
        Ok(album.save(payload)?)
    }

    /// Whether `control` of `stage` should currently be enabled.
    #[must_use]
    pub fn is_enabled(&self, stage: PipelineStage, control: Control) -> bool {
        let slot = self.slot(stage);
        let working = stage == self.active && !slot.completed;
        let idle = slot.status != StageStatus::InFlight;
        match control {
            Control::FilePicker => stage.is_upload() && working && idle,
            Control::Action(action) => match action {
                Action::Run => {
                    stage.is_edit()
                        && working
                        && slot.status == StageStatus::Idle
                        && self.inputs_ready(stage)
                }
                Action::Retry => {
                    stage.is_edit()
                        && working
                        && matches!(slot.status, StageStatus::Failed | StageStatus::Succeeded)
                        && self.inputs_ready(stage)
                }
                Action::Approve => {
                    stage.is_edit() && working && slot.status == StageStatus::Succeeded
                }
                Action::Download => idle && slot.output.is_some(),
                Action::TryAnotherOutfit => {
                    stage == PipelineStage::Combine && self.active == PipelineStage::Combine
                }
                Action::SaveToAlbum => {
                    stage == PipelineStage::Combine
                        && slot.status == StageStatus::Succeeded
                        && slot.output.is_some()
                }
            },
        }
    }

    /// Emit the full render state of every stage to `presenter`.
    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        for stage in PipelineStage::ALL {
            let slot = self.slot(stage);
            presenter.set_phase(stage, self.phase(stage));
            presenter.set_loading(stage, slot.status == StageStatus::InFlight);
            presenter.set_output_image(stage, slot.output.as_ref());
            presenter.set_error_text(stage, slot.error.as_deref());

            let (enabled, disabled): (Vec<Control>, Vec<Control>) = stage_controls(stage)
                .iter()
                .copied()
                .partition(|&control| self.is_enabled(stage, control));
            presenter.set_controls_enabled(stage, &enabled, true);
            presenter.set_controls_enabled(stage, &disabled, false);
        }
    }
}
