mod settings;

use dioxus::prelude::*;
use vestir_gemini::GeminiClient;
use vestir_io::{Album, LocalStorage, StagePanel, WorkflowView, download};
use vestir_pipeline::{EditOutcome, Effect, Intent, PipelineError, PipelineStage, Session, execute};

fn main() {
    dioxus::launch(app);
}

/// Root application component.
///
/// Owns the session (workflow plus album), the client settings and the
/// client built from them as Dioxus signals. Every user input becomes an [`Intent`]; the resulting
/// [`Effect`] is carried out here.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut session = use_signal(|| Session::new(LocalStorage::new()));
    let mut config = use_signal(|| settings::load(&LocalStorage::new()));
    let mut key_draft = use_signal(|| config.peek().api_key().unwrap_or_default().to_owned());
    let mut warning = use_signal(|| Option::<String>::None);

    // Replaced only when the settings are saved, so requests share one
    // connection pool.
    let mut client = use_signal(|| GeminiClient::new(config.peek().clone()));

    // --- Intent dispatcher ---
    let mut dispatch = move |intent: Intent| {
        let outcome = session.write().handle(intent);
        match outcome {
            Ok(Effect::Edit(ticket)) => {
                let client = client();
                spawn(async move {
                    // Yield to the browser event loop so the loading
                    // state paints before the request goes out.
                    gloo_timers::future::TimeoutFuture::new(0).await;

                    let result = execute(&client, &ticket).await;
                    let stage = ticket.stage();
                    if session.write().finish_edit(ticket, result) == EditOutcome::Discarded {
                        tracing::debug!(%stage, "edit result arrived after the stage moved on");
                    }
                });
            }
            Ok(Effect::Download(file)) => {
                if let Err(e) = download::save_download(&file) {
                    tracing::warn!(error = %e, "download failed");
                    warning.set(Some(format!("Download failed: {e}")));
                }
            }
            Ok(Effect::Saved { index }) => tracing::info!(index, "result saved to album"),
            Ok(Effect::Removed { index }) => tracing::info!(index, "album entry removed"),
            Ok(Effect::None) => {}
            Err(PipelineError::Persistence(e)) => {
                tracing::warn!(error = %e, "album change not persisted");
                warning.set(Some(format!(
                    "Your album could not be stored in this browser ({e}). \
                     Changes are kept until the page is closed."
                )));
            }
            Err(e) => tracing::warn!(error = %e, "intent rejected"),
        }
    };

    // --- Settings handler ---
    let save_key = move |_: MouseEvent| {
        let draft = key_draft();
        let draft = draft.trim();
        let mut next = config();
        next.api_key = (!draft.is_empty()).then(|| draft.to_owned());

        let mut store = LocalStorage::new();
        if let Err(e) = settings::save(&mut store, &next) {
            tracing::warn!(error = %e, "settings not persisted");
            warning.set(Some(format!("Settings could not be stored ({e}).")));
        }
        client.set(GeminiClient::new(next.clone()));
        config.set(next);
    };

    let view = WorkflowView::of(&session.read());
    let finished = session.read().pipeline().is_finished();
    let has_key = config.read().api_key().is_some();

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/main.css") }

        div { class: "app",
            header { class: "app-header",
                div {
                    h1 { class: "title-brand", "vestir" }
                    p { class: "text-muted",
                        "Try an outfit on a photo, one guided step at a time"
                    }
                }
                button {
                    class: "btn",
                    onclick: move |_| dispatch(Intent::Reset),
                    "Start over"
                }
            }

            // Settings
            div { class: "settings",
                label { r#for: "api-key", "Gemini API key" }
                input {
                    id: "api-key",
                    r#type: "password",
                    autocomplete: "off",
                    value: "{key_draft}",
                    oninput: move |evt| key_draft.set(evt.value()),
                }
                button { class: "btn btn-primary", onclick: save_key, "Save" }
                if !has_key {
                    p { class: "text-muted text-small",
                        "Generative steps need an API key. It is stored only in this browser."
                    }
                }
            }

            // Persistence / download warnings
            if let Some(ref message) = warning() {
                div { class: "warning-banner", role: "status",
                    p { "{message}" }
                    button {
                        class: "btn btn-icon",
                        aria_label: "Dismiss",
                        onclick: move |_| warning.set(None),
                        "×"
                    }
                }
            }

            if finished {
                div { class: "success-banner",
                    p { "Look approved. Save it to your album or try another outfit." }
                }
            }

            main { class: "stages",
                for stage in PipelineStage::ALL {
                    StagePanel {
                        key: "{stage.slug()}",
                        stage,
                        view: view.stage(stage).clone(),
                        on_intent: dispatch,
                    }
                }
            }

            Album {
                entries: view.album.clone(),
                on_intent: dispatch,
            }
        }
    }
}
