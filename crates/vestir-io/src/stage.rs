//! User-facing copy for stages and their buttons.

use vestir_pipeline::{Action, PipelineStage};

/// One-sentence explanation shown under a stage heading.
#[must_use]
pub const fn hint(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::ModelUpload => "Choose a clear, front-facing photo of the person.",
        PipelineStage::ModelClean => {
            "Remove accessories and tidy the pose so the outfit fits cleanly."
        }
        PipelineStage::OutfitUpload => "Choose a photo of the garment, worn or laid flat.",
        PipelineStage::OutfitIsolate => "Cut the garment out of its photo onto a plain background.",
        PipelineStage::Combine => "Dress the cleaned model in the isolated outfit.",
    }
}

/// 1-based step number shown in the stage badge.
#[must_use]
pub const fn step_number(stage: PipelineStage) -> usize {
    stage.index() + 1
}

/// Text shown while a stage's request is outstanding.
#[must_use]
pub const fn loading_text(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::ModelUpload | PipelineStage::OutfitUpload => "Reading file...",
        PipelineStage::ModelClean => "Cleaning up the model...",
        PipelineStage::OutfitIsolate => "Isolating the outfit...",
        PipelineStage::Combine => "Generating the try-on...",
    }
}

/// Button label for an action.
#[must_use]
pub const fn action_label(action: Action) -> &'static str {
    match action {
        Action::Run => "Run",
        Action::Retry => "Retry",
        Action::Approve => "Approve",
        Action::Download => "Download",
        Action::TryAnotherOutfit => "Try another outfit",
        Action::SaveToAlbum => "Save to album",
    }
}

/// Whether the button is the stage's main call to action.
#[must_use]
pub const fn is_primary(action: Action) -> bool {
    matches!(action, Action::Run | Action::Approve | Action::SaveToAlbum)
}
