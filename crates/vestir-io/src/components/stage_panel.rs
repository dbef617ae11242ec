//! One panel per workflow stage.
//!
//! Shows the stage's badge, hint, current image, busy indicator, error
//! text and buttons. Everything comes from the [`StageView`]; clicks go
//! back out as [`Intent`]s.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{
    LdCheck, LdDownload, LdPlay, LdRotateCcw, LdSave, LdShirt,
};
use vestir_pipeline::{
    Action, Control, Intent, PipelineStage, SourceFile, StagePhase, stage_controls,
};

use super::upload::FileUpload;
use crate::stage;
use crate::view::StageView;

/// Buttons each stage shows, in display order.
fn buttons(stage: PipelineStage) -> impl Iterator<Item = Action> {
    stage_controls(stage).iter().filter_map(|control| match control {
        Control::Action(action) => Some(*action),
        Control::FilePicker => None,
    })
}

/// Props for the [`StagePanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct StagePanelProps {
    /// Which stage this panel shows.
    stage: PipelineStage,
    /// Render state of the stage.
    view: StageView,
    /// Called with every user input on the panel.
    on_intent: EventHandler<Intent>,
}

/// A workflow stage: upload zone or edit controls plus its image.
#[component]
pub fn StagePanel(props: StagePanelProps) -> Element {
    let stage = props.stage;
    let view = &props.view;
    let on_intent = props.on_intent;

    let phase_class = match view.phase {
        StagePhase::Pending => "stage stage-pending",
        StagePhase::Active => "stage stage-active",
        StagePhase::Completed => "stage stage-completed",
    };
    let step = stage::step_number(stage);

    rsx! {
        section {
            class: "{phase_class}",
            aria_label: "{stage.label()}",

            header { class: "stage-header",
                span { class: "stage-badge",
                    if view.phase == StagePhase::Completed {
                        Icon { width: 14, height: 14, icon: LdCheck }
                    } else {
                        "{step}"
                    }
                }
                h2 { class: "stage-title", "{stage.label()}" }
            }
            p { class: "text-secondary text-small", "{stage::hint(stage)}" }

            if stage.is_upload() && view.phase == StagePhase::Active {
                FileUpload {
                    enabled: view.is_enabled(Control::FilePicker),
                    on_select: move |file: SourceFile| on_intent.call(Intent::SelectFile { stage, file }),
                }
            }

            div { class: "stage-image",
                if view.loading {
                    p { class: "loading", "{stage::loading_text(stage)}" }
                } else if let Some(ref image) = view.image {
                    img {
                        src: "{image.data_url()}",
                        alt: "{stage.label()} result",
                    }
                } else {
                    p { class: "text-placeholder", "No image yet" }
                }
            }

            if let Some(ref err) = view.error {
                div { class: "error-box", role: "alert",
                    p { class: "text-error text-small", "{err}" }
                }
            }

            div { class: "stage-actions",
                for action in buttons(stage) {
                    {render_button(stage, action, view.is_enabled(Control::Action(action)), on_intent)}
                }
            }
        }
    }
}

/// Render a single stage button.
fn render_button(
    stage: PipelineStage,
    action: Action,
    enabled: bool,
    on_intent: EventHandler<Intent>,
) -> Element {
    let class = if stage::is_primary(action) {
        "btn btn-primary"
    } else {
        "btn"
    };
    let label = stage::action_label(action);

    rsx! {
        button {
            class: "{class}",
            disabled: !enabled,
            onclick: move |_| on_intent.call(Intent::ClickAction { stage, action }),
            {render_icon(action)}
            span { "{label}" }
        }
    }
}

fn render_icon(action: Action) -> Element {
    match action {
        Action::Run => rsx! { Icon { width: 16, height: 16, icon: LdPlay } },
        Action::Retry => rsx! { Icon { width: 16, height: 16, icon: LdRotateCcw } },
        Action::Approve => rsx! { Icon { width: 16, height: 16, icon: LdCheck } },
        Action::Download => rsx! { Icon { width: 16, height: 16, icon: LdDownload } },
        Action::SaveToAlbum => rsx! { Icon { width: 16, height: 16, icon: LdSave } },
        Action::TryAnotherOutfit => rsx! { Icon { width: 16, height: 16, icon: LdShirt } },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_shows_every_action_once() {
        let shown: Vec<_> = buttons(PipelineStage::Combine).collect();
        for action in Action::ALL {
            assert_eq!(
                shown.iter().filter(|&&a| a == action).count(),
                1,
                "{action:?} should appear exactly once"
            );
        }
    }

    #[test]
    fn upload_stages_only_offer_download() {
        for stage in [PipelineStage::ModelUpload, PipelineStage::OutfitUpload] {
            assert_eq!(buttons(stage).collect::<Vec<_>>(), [Action::Download]);
        }
    }
}
