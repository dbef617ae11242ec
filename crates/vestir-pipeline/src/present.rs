//! Boundary between the workflow and whatever draws it.
//!
//! The workflow never touches a UI toolkit. It pushes render state out
//! through [`Presenter`] commands and accepts user input as [`Intent`]s.

use crate::pipeline::StagePhase;
use crate::types::{ImagePayload, PipelineStage, SourceFile};

/// A button offered by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Send the first generative request.
    Run,
    /// Send the same request again.
    Retry,
    /// Accept the current result and move on.
    Approve,
    /// Save the stage's image to disk.
    Download,
    /// Go back to the outfit upload keeping the cleaned model.
    TryAnotherOutfit,
    /// Add the final result to the album.
    SaveToAlbum,
}

impl Action {
    /// Every action, in the order stages lay them out.
    pub const ALL: [Self; 6] = [
        Self::Run,
        Self::Retry,
        Self::Approve,
        Self::Download,
        Self::SaveToAlbum,
        Self::TryAnotherOutfit,
    ];
}

/// Any input element of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// The file chooser of an upload stage.
    FilePicker,
    /// One of the stage buttons.
    Action(Action),
}

/// Render commands issued by the workflow.
///
/// Every command is idempotent; a presenter may be handed the full state
/// after every change.
pub trait Presenter {
    /// Show whether `stage` is pending, active, or completed.
    fn set_phase(&mut self, stage: PipelineStage, phase: StagePhase);

    /// Show or hide the busy indicator of `stage`.
    fn set_loading(&mut self, stage: PipelineStage, loading: bool);

    /// Show `image` as the current image of `stage`, or clear it.
    fn set_output_image(&mut self, stage: PipelineStage, image: Option<&ImagePayload>);

    /// Show `text` as the error of `stage`, or clear it.
    fn set_error_text(&mut self, stage: PipelineStage, text: Option<&str>);

    /// Enable or disable `controls` of `stage`.
    fn set_controls_enabled(&mut self, stage: PipelineStage, controls: &[Control], enabled: bool);

    /// Show the saved album, oldest first.
    fn render_album(&mut self, entries: &[ImagePayload]);
}

/// User input delivered to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A file was chosen for an upload stage.
    SelectFile {
        /// Upload stage the file was chosen for.
        stage: PipelineStage,
        /// The chosen file.
        file: SourceFile,
    },
    /// A stage button was clicked.
    ClickAction {
        /// Stage the button belongs to.
        stage: PipelineStage,
        /// Which button.
        action: Action,
    },
    /// The delete button of an album entry was clicked.
    DeleteAlbumEntry(usize),
    /// The download button of an album entry was clicked.
    DownloadAlbumEntry(usize),
    /// Start over from the model upload.
    Reset,
}
