//! Render state collected from [`Presenter`] commands.
//!
//! Components take plain values as props, so the app asks the session
//! to present itself into a [`WorkflowView`] and hands the pieces down.

use std::collections::HashSet;

use vestir_pipeline::{
    Control, ImagePayload, KeyValueStore, PipelineStage, Presenter, Session, StagePhase,
};

/// What one stage panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    /// Pending, active, or completed.
    pub phase: StagePhase,
    /// Whether a request is outstanding.
    pub loading: bool,
    /// Current image.
    pub image: Option<ImagePayload>,
    /// Error of the last failed attempt.
    pub error: Option<String>,
    /// Controls that accept input right now.
    pub enabled: HashSet<Control>,
}

impl Default for StageView {
    fn default() -> Self {
        Self {
            phase: StagePhase::Pending,
            loading: false,
            image: None,
            error: None,
            enabled: HashSet::new(),
        }
    }
}

impl StageView {
    /// Whether `control` accepts input.
    #[must_use]
    pub fn is_enabled(&self, control: Control) -> bool {
        self.enabled.contains(&control)
    }
}

/// What the whole page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowView {
    stages: [StageView; 5],
    /// Saved results, oldest first.
    pub album: Vec<ImagePayload>,
}

impl WorkflowView {
    /// Collect the full render state of `session`.
    #[must_use]
    pub fn of<S: KeyValueStore>(session: &Session<S>) -> Self {
        let mut view = Self::default();
        session.present(&mut view);
        view
    }

    /// Render state of `stage`.
    #[must_use]
    pub const fn stage(&self, stage: PipelineStage) -> &StageView {
        &self.stages[stage.index()]
    }

    const fn stage_mut(&mut self, stage: PipelineStage) -> &mut StageView {
        &mut self.stages[stage.index()]
    }
}

impl Presenter for WorkflowView {
    fn set_phase(&mut self, stage: PipelineStage, phase: StagePhase) {
        self.stage_mut(stage).phase = phase;
    }

    fn set_loading(&mut self, stage: PipelineStage, loading: bool) {
        self.stage_mut(stage).loading = loading;
    }

    fn set_output_image(&mut self, stage: PipelineStage, image: Option<&ImagePayload>) {
        self.stage_mut(stage).image = image.cloned();
    }

    fn set_error_text(&mut self, stage: PipelineStage, text: Option<&str>) {
        self.stage_mut(stage).error = text.map(str::to_owned);
    }

    fn set_controls_enabled(&mut self, stage: PipelineStage, controls: &[Control], enabled: bool) {
        let set = &mut self.stage_mut(stage).enabled;
        for &control in controls {
            if enabled {
                set.insert(control);
            } else {
                set.remove(&control);
            }
        }
    }

    fn render_album(&mut self, entries: &[ImagePayload]) {
        self.album = entries.to_vec();
    }
}
