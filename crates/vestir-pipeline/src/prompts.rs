//! Fixed instructions sent with each generative stage.

use crate::types::PipelineStage;

/// Instruction for [`PipelineStage::ModelClean`].
pub const MODEL_CLEAN: &str = "Remove any accessories such as bags, hats, sunglasses, jewelry, \
    scarves and watches from the person in this photo. Keep the person's face, hair, body, pose, \
    clothing and the background exactly as they are. Return a single photorealistic image.";

/// Instruction for [`PipelineStage::OutfitIsolate`].
pub const OUTFIT_ISOLATE: &str = "Extract only the garment from this photo. Remove any person, \
    mannequin, hanger and background, and place the garment on a plain white background as a \
    flat product shot. Preserve the garment's exact colors, patterns, texture and details.";

/// Instruction for [`PipelineStage::Combine`].
pub const COMBINE: &str = "Dress the person in the first image in the garment shown in the \
    second image. Keep the person's face, hair, body shape, pose and the background unchanged. \
    Make the garment fit naturally with realistic folds, lighting and shadows. Return a single \
    photorealistic image.";

/// The instruction for `stage`, or `None` for the upload stages.
#[must_use]
pub const fn instruction(stage: PipelineStage) -> Option<&'static str> {
    match stage {
        PipelineStage::ModelClean => Some(MODEL_CLEAN),
        PipelineStage::OutfitIsolate => Some(OUTFIT_ISOLATE),
        PipelineStage::Combine => Some(COMBINE),
        PipelineStage::ModelUpload | PipelineStage::OutfitUpload => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_edit_stage_has_an_instruction() {
        for stage in PipelineStage::ALL {
            assert_eq!(
                instruction(stage).is_some(),
                stage.is_edit(),
                "{stage} instruction presence does not match is_edit()"
            );
        }
    }

    #[test]
    fn model_clean_asks_to_remove_accessories() {
        assert!(MODEL_CLEAN.starts_with("Remove any accessories"));
    }
}
