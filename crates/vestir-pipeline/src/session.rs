//! One user session: the workflow plus the album, driven by intents.
//!
//! [`Session::handle`] is the single entry point a presentation layer
//! calls. Anything that needs I/O comes back as an [`Effect`] for the
//! caller to perform; edits are completed later through
//! [`Session::finish_edit`].

use crate::album::AlbumStore;
use crate::pipeline::{self, Download, EditOutcome, EditTicket, Pipeline};
use crate::present::{Action, Intent, Presenter};
use crate::storage::KeyValueStore;
use crate::types::{EditError, ImagePayload, PipelineError, PipelineStage};

/// Work the caller must carry out after an intent was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Nothing beyond re-rendering.
    None,
    /// Send this request to the image service, then call
    /// [`Session::finish_edit`] with the answer.
    Edit(EditTicket),
    /// Offer this image to the user as a file.
    Download(Download),
    /// The final result was added to the album at `index`.
    Saved {
        /// Position of the new entry.
        index: usize,
    },
    /// The album entry at `index` was deleted.
    Removed {
        /// Position the entry had.
        index: usize,
    },
}

/// Workflow state and album of one user.
#[derive(Debug)]
pub struct Session<S> {
    pipeline: Pipeline,
    album: AlbumStore<S>,
}

impl<S: KeyValueStore> Session<S> {
    /// Start a fresh workflow, loading the album from `store`.
    pub fn new(store: S) -> Self {
        Self::with_album(AlbumStore::load(store))
    }

    /// Start a fresh workflow with an already loaded album.
    #[must_use]
    pub fn with_album(album: AlbumStore<S>) -> Self {
        Self {
            pipeline: Pipeline::new(),
            album,
        }
    }

    /// The workflow state machine.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The saved results.
    #[must_use]
    pub const fn album(&self) -> &AlbumStore<S> {
        &self.album
    }

    /// Apply one user intent.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] that rejected the intent. A
    /// [`PipelineError::Persistence`] from saving still leaves the entry
    /// in the in-memory album.
    pub fn handle(&mut self, intent: Intent) -> Result<Effect, PipelineError> {
        match intent {
            Intent::SelectFile { stage, file } => {
                self.pipeline.upload(stage, &file)?;
                Ok(Effect::None)
            }
            Intent::ClickAction { stage, action } => self.click(stage, action),
            Intent::DeleteAlbumEntry(index) => Ok(match self.album.remove(index)? {
                Some(_) => Effect::Removed { index },
                None => Effect::None,
            }),
            Intent::DownloadAlbumEntry(index) => Ok(self
                .album
                .get(index)
                .map_or(Effect::None, |payload| {
                    Effect::Download(album_download(index, payload))
                })),
            Intent::Reset => {
                self.pipeline.reset();
                Ok(Effect::None)
            }
        }
    }

    fn click(&mut self, stage: PipelineStage, action: Action) -> Result<Effect, PipelineError> {
        tracing::debug!(%stage, ?action, "action clicked");
        match action {
            Action::Run | Action::Retry => Ok(Effect::Edit(self.pipeline.begin_edit(stage)?)),
            Action::Approve => {
                self.pipeline.approve(stage)?;
                Ok(Effect::None)
            }
            Action::Download => Ok(Effect::Download(self.pipeline.download(stage)?)),
            Action::TryAnotherOutfit => {
                self.pipeline.restart_outfit()?;
                Ok(Effect::None)
            }
            Action::SaveToAlbum => {
                let index = self.pipeline.save_result(&mut self.album)?;
                Ok(Effect::Saved { index })
            }
        }
    }

    /// Record the answer to a request handed out as [`Effect::Edit`].
    pub fn finish_edit(
        &mut self,
        ticket: EditTicket,
        outcome: Result<ImagePayload, EditError>,
    ) -> EditOutcome {
        self.pipeline.finish_edit(ticket, outcome)
    }

    /// Emit the full render state to `presenter`.
    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        self.pipeline.present(presenter);
        self.album.present(presenter);
    }

    /// Give back the album store.
    #[must_use]
    pub fn into_album(self) -> AlbumStore<S> {
        self.album
    }
}

fn album_download(index: usize, payload: &ImagePayload) -> Download {
    Download {
        filename: format!(
            "vestir-album-{}-{}.{}",
            index + 1,
            pipeline::unix_millis(),
            payload.file_extension()
        ),
        payload: payload.clone(),
    }
}
