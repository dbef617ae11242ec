//! End-to-end walks through the try-on workflow with a scripted image
//! service.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use futures::executor::block_on;
use vestir_pipeline::{
    Action, AlbumStore, EditError, EditOutcome, Effect, ImageEditor, ImagePayload, Intent,
    MemoryStore, Pipeline, PipelineStage, Session, SourceFile, StageStatus, execute, prompts,
    run_edit,
};

/// Image service double that answers from a script and records requests.
#[derive(Default)]
struct ScriptedEditor {
    answers: RefCell<VecDeque<Result<ImagePayload, EditError>>>,
    requests: RefCell<Vec<(String, Vec<ImagePayload>)>>,
}

impl ScriptedEditor {
    fn answering(answers: impl IntoIterator<Item = Result<ImagePayload, EditError>>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            requests: RefCell::default(),
        }
    }
}

#[async_trait(?Send)]
impl ImageEditor for ScriptedEditor {
    async fn edit(
        &self,
        instruction: &str,
        inputs: &[ImagePayload],
    ) -> Result<ImagePayload, EditError> {
        self.requests
            .borrow_mut()
            .push((instruction.to_owned(), inputs.to_vec()));
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(EditError::Transport("script exhausted".into())))
    }
}

fn png(tag: &str) -> ImagePayload {
    ImagePayload::new(tag, "image/png")
}

fn jpeg_file(name: &str, len: usize) -> SourceFile {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len, 0x11);
    SourceFile::new(name, "image/jpeg", bytes)
}

fn drive(session: &mut Session<MemoryStore>, editor: &ScriptedEditor, intent: Intent) -> Effect {
    match session.handle(intent).unwrap() {
        Effect::Edit(ticket) => {
            let outcome = block_on(execute(editor, &ticket));
            session.finish_edit(ticket, outcome);
            Effect::None
        }
        other => other,
    }
}

fn click(stage: PipelineStage, action: Action) -> Intent {
    Intent::ClickAction { stage, action }
}

#[test]
fn full_try_on_and_save() {
    let editor = ScriptedEditor::answering([
        Ok(png("clean")),
        Ok(png("isolated")),
        Ok(png("dressed")),
    ]);
    let mut session = Session::new(MemoryStore::default());

    let model = jpeg_file("model.jpg", 50 * 1024);
    drive(
        &mut session,
        &editor,
        Intent::SelectFile {
            stage: PipelineStage::ModelUpload,
            file: model.clone(),
        },
    );
    let uploaded = session
        .pipeline()
        .output(PipelineStage::ModelUpload)
        .unwrap()
        .clone();
    assert_eq!(uploaded.media_type, "image/jpeg");
    assert_eq!(uploaded.decode_bytes().unwrap(), model.bytes);

    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Run));
    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Approve));
    drive(
        &mut session,
        &editor,
        Intent::SelectFile {
            stage: PipelineStage::OutfitUpload,
            file: jpeg_file("shirt.jpg", 2048),
        },
    );
    drive(&mut session, &editor, click(PipelineStage::OutfitIsolate, Action::Run));
    drive(&mut session, &editor, click(PipelineStage::OutfitIsolate, Action::Approve));
    drive(&mut session, &editor, click(PipelineStage::Combine, Action::Run));

    assert_eq!(
        session.pipeline().output(PipelineStage::Combine),
        Some(&png("dressed"))
    );

    let requests = editor.requests.borrow();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].0, prompts::MODEL_CLEAN);
    assert_eq!(requests[0].1, vec![uploaded]);
    assert_eq!(requests[1].0, prompts::OUTFIT_ISOLATE);
    assert_eq!(requests[2].0, prompts::COMBINE);
    assert_eq!(requests[2].1, vec![png("clean"), png("isolated")]);
    drop(requests);

    let effect = drive(&mut session, &editor, click(PipelineStage::Combine, Action::SaveToAlbum));
    assert_eq!(effect, Effect::Saved { index: 0 });

    let reloaded = AlbumStore::load(session.into_album().into_store());
    assert_eq!(reloaded.entries(), &[png("dressed")]);
}

#[test]
fn text_only_answer_fails_and_retry_repeats_the_request() {
    let editor = ScriptedEditor::answering([
        Err(EditError::ContentBlockedOrEmpty(Some("SAFETY".into()))),
        Ok(png("clean")),
    ]);
    let mut session = Session::new(MemoryStore::default());
    drive(
        &mut session,
        &editor,
        Intent::SelectFile {
            stage: PipelineStage::ModelUpload,
            file: jpeg_file("model.jpg", 512),
        },
    );

    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Run));
    let slot = session.pipeline().slot(PipelineStage::ModelClean);
    assert_eq!(slot.status(), StageStatus::Failed);
    assert!(slot.error().unwrap().contains("SAFETY"));
    assert!(
        session
            .handle(click(PipelineStage::ModelClean, Action::Approve))
            .is_err()
    );

    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Retry));
    assert_eq!(
        session.pipeline().status(PipelineStage::ModelClean),
        StageStatus::Succeeded
    );

    let requests = editor.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[test]
fn try_another_outfit_reuses_the_cleaned_model() {
    let editor = ScriptedEditor::answering([
        Ok(png("clean")),
        Ok(png("isolated-1")),
        Ok(png("dressed-1")),
        Ok(png("isolated-2")),
        Ok(png("dressed-2")),
    ]);
    let mut session = Session::new(MemoryStore::default());
    let select = |stage, name| Intent::SelectFile {
        stage,
        file: jpeg_file(name, 256),
    };

    drive(&mut session, &editor, select(PipelineStage::ModelUpload, "me.jpg"));
    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Run));
    drive(&mut session, &editor, click(PipelineStage::ModelClean, Action::Approve));
    for round in ["shirt.jpg", "dress.jpg"] {
        drive(&mut session, &editor, select(PipelineStage::OutfitUpload, round));
        drive(&mut session, &editor, click(PipelineStage::OutfitIsolate, Action::Run));
        drive(&mut session, &editor, click(PipelineStage::OutfitIsolate, Action::Approve));
        drive(&mut session, &editor, click(PipelineStage::Combine, Action::Run));
        drive(
            &mut session,
            &editor,
            click(PipelineStage::Combine, Action::TryAnotherOutfit),
        );
    }

    let requests = editor.requests.borrow();
    // One clean, then isolate + combine per outfit.
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[4].1[0], png("clean"));
    assert_eq!(requests[4].1[1], png("isolated-2"));
}

#[test]
fn run_edit_drops_answers_that_arrive_after_a_reset() {
    let pipeline = RefCell::new(Pipeline::new());
    pipeline
        .borrow_mut()
        .upload(PipelineStage::ModelUpload, &jpeg_file("me.jpg", 64))
        .unwrap();

    /// Editor that resets the workflow while the request is outstanding.
    struct ResettingEditor<'a>(&'a RefCell<Pipeline>);

    #[async_trait(?Send)]
    impl ImageEditor for ResettingEditor<'_> {
        async fn edit(
            &self,
            _instruction: &str,
            _inputs: &[ImagePayload],
        ) -> Result<ImagePayload, EditError> {
            self.0.borrow_mut().reset();
            Ok(png("late"))
        }
    }

    let outcome = block_on(run_edit(
        &pipeline,
        &ResettingEditor(&pipeline),
        PipelineStage::ModelClean,
    ))
    .unwrap();
    assert_eq!(outcome, EditOutcome::Discarded);
    assert_eq!(pipeline.borrow().active(), PipelineStage::ModelUpload);
    assert!(pipeline.borrow().output(PipelineStage::ModelClean).is_none());
}

#[test]
fn run_edit_rejects_missing_inputs_without_calling_the_service() {
    let pipeline = RefCell::new(Pipeline::new());
    let editor = ScriptedEditor::default();
    let result = block_on(run_edit(&pipeline, &editor, PipelineStage::Combine));
    assert!(result.is_err());
    assert!(editor.requests.borrow().is_empty());
}
