//! Shared types for the vestir try-on workflow.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// An encoded image ready for transport or storage.
///
/// `encoded_data` holds the image bytes as standard, padded base64.
/// Payloads are immutable once produced; stages and the album keep
/// their own clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub encoded_data: String,
    /// Media type of the image, e.g. `"image/png"`.
    pub media_type: String,
}

impl ImagePayload {
    /// Create a payload from already-encoded base64 data.
    #[must_use]
    pub fn new(encoded_data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            encoded_data: encoded_data.into(),
            media_type: media_type.into(),
        }
    }

    /// Create a payload by base64-encoding raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            encoded_data: STANDARD.encode(bytes),
            media_type: media_type.into(),
        }
    }

    /// Decode the base64 data back into raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Base64`] if the data is not valid base64.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(STANDARD.decode(self.encoded_data.as_bytes())?)
    }

    /// `data:` URL for use as an `<img src>`.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.encoded_data)
    }

    /// File extension matching the media type, for downloads.
    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "img",
        }
    }

    /// Length of the encoded data in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.encoded_data.len()
    }
}

/// A file chosen by the user, after its bytes have been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name as reported by the picker.
    pub name: String,
    /// Media type declared by the source, if any.
    pub media_type: Option<String>,
    /// Full file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file with a declared media type.
    #[must_use]
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: Some(media_type.into()),
            bytes,
        }
    }

    /// Create a source file whose media type must be detected.
    #[must_use]
    pub fn undeclared(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes,
        }
    }
}

/// The five stages of the try-on workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Upload a photo of the person.
    ModelUpload,
    /// Remove accessories from the person photo.
    ModelClean,
    /// Upload a photo of the garment.
    OutfitUpload,
    /// Isolate the garment from its background.
    OutfitIsolate,
    /// Dress the cleaned person in the isolated garment.
    Combine,
}

impl PipelineStage {
    /// All stages in workflow order.
    pub const ALL: [Self; 5] = [
        Self::ModelUpload,
        Self::ModelClean,
        Self::OutfitUpload,
        Self::OutfitIsolate,
        Self::Combine,
    ];

    /// Position of the stage in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ModelUpload => 0,
            Self::ModelClean => 1,
            Self::OutfitUpload => 2,
            Self::OutfitIsolate => 3,
            Self::Combine => 4,
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::ModelUpload => Some(Self::ModelClean),
            Self::ModelClean => Some(Self::OutfitUpload),
            Self::OutfitUpload => Some(Self::OutfitIsolate),
            Self::OutfitIsolate => Some(Self::Combine),
            Self::Combine => None,
        }
    }

    /// Whether the stage takes a file from the user.
    #[must_use]
    pub const fn is_upload(self) -> bool {
        matches!(self, Self::ModelUpload | Self::OutfitUpload)
    }

    /// Whether the stage runs a generative edit.
    #[must_use]
    pub const fn is_edit(self) -> bool {
        !self.is_upload()
    }

    /// Display label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ModelUpload => "Upload model",
            Self::ModelClean => "Clean model",
            Self::OutfitUpload => "Upload outfit",
            Self::OutfitIsolate => "Isolate outfit",
            Self::Combine => "Try on",
        }
    }

    /// Lowercase identifier used in file names and element ids.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ModelUpload => "model",
            Self::ModelClean => "model-clean",
            Self::OutfitUpload => "outfit",
            Self::OutfitIsolate => "outfit-isolated",
            Self::Combine => "result",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StageStatus {
    /// Nothing has been attempted since the stage was (re)set.
    #[default]
    Idle,
    /// A generative call is outstanding.
    InFlight,
    /// The last attempt produced an image.
    Succeeded,
    /// The last attempt failed; the error text is kept on the slot.
    Failed,
}

/// Errors turning a user file into an [`ImagePayload`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The file contained no bytes.
    #[error("the selected file is empty")]
    EmptyInput,

    /// The presentation layer could not read the file.
    #[error("failed to read file: {0}")]
    Unreadable(String),

    /// No media type was declared and none could be detected.
    #[error("could not determine the image type of {0}")]
    UnknownMediaType(String),

    /// The declared media type is not an image type.
    #[error("not an image: {0}")]
    NotAnImage(String),

    /// Stored or received data is not valid base64.
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from the generative edit service.
///
/// Serializable so that the error text can be carried across a
/// process or worker boundary unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EditError {
    /// The service could not be reached or answered with a non-2xx status.
    #[error("image service unavailable: {0}")]
    Transport(String),

    /// The service answered but returned no image, usually because the
    /// instruction was refused.
    #[error("{}", blocked_message(.0))]
    ContentBlockedOrEmpty(Option<String>),

    /// The response body or its image data could not be decoded.
    #[error("malformed response from image service: {0}")]
    Decode(String),
}

#[allow(clippy::ref_option)]
fn blocked_message(reason: &Option<String>) -> String {
    reason.as_deref().map_or_else(
        || "the image service returned no image".to_owned(),
        |r| format!("the image service returned no image ({r})"),
    )
}

/// Errors reading or writing the persistence substrate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The storage backend is missing or refused access.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The storage backend is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The data could not be serialized.
    #[error("failed to serialize stored data: {0}")]
    Serialize(String),

    /// A filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// A workflow operation was rejected.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Files can only be selected for the two upload stages.
    #[error("{0} does not accept files")]
    NotUploadStage(PipelineStage),

    /// Edits can only be run for the three generative stages.
    #[error("{0} has no edit step")]
    NotEditStage(PipelineStage),

    /// The stage is not the active one.
    #[error("{stage} is not active (active stage: {active})")]
    NotActive {
        /// Stage the operation targeted.
        stage: PipelineStage,
        /// Stage that is currently active.
        active: PipelineStage,
    },

    /// The stage has already been approved.
    #[error("{0} is already completed")]
    AlreadyCompleted(PipelineStage),

    /// A required input of the stage is empty.
    #[error("{0} is missing its input image")]
    MissingInput(PipelineStage),

    /// A call for the stage is still outstanding.
    #[error("{0} is still processing")]
    InFlight(PipelineStage),

    /// The stage has no successful result to approve or save.
    #[error("{0} has no successful result")]
    NotSucceeded(PipelineStage),

    /// The stage holds no image to download.
    #[error("{0} has no image")]
    NoOutput(PipelineStage),

    /// "Try another outfit" is only offered from the final stage.
    #[error("another outfit can only be tried from the {} stage", PipelineStage::Combine)]
    NotAtCombine,

    /// The selected file could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The album could not be persisted.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_stage_in_order() {
        assert_eq!(PipelineStage::ALL.len(), 5);
        for (i, stage) in PipelineStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i, "{stage} has the wrong index");
        }
    }

    #[test]
    fn next_follows_all() {
        for pair in PipelineStage::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(PipelineStage::Combine.next(), None);
    }

    #[test]
    fn upload_and_edit_stages_partition_all() {
        let uploads: Vec<_> = PipelineStage::ALL
            .into_iter()
            .filter(|s| s.is_upload())
            .collect();
        assert_eq!(
            uploads,
            [PipelineStage::ModelUpload, PipelineStage::OutfitUpload]
        );
        assert_eq!(
            PipelineStage::ALL.into_iter().filter(|s| s.is_edit()).count(),
            3
        );
    }

    #[test]
    fn payload_serializes_with_wire_field_names() {
        let payload = ImagePayload::new("AAAA", "image/png");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"encodedData":"AAAA","mediaType":"image/png"}"#);
    }

    #[test]
    fn payload_bytes_survive_base64() {
        let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 255];
        let payload = ImagePayload::from_bytes(&bytes, "image/png");
        assert_eq!(payload.decode_bytes().unwrap(), bytes);
    }

    #[test]
    fn payload_rejects_invalid_base64() {
        let payload = ImagePayload::new("not base64!!", "image/png");
        assert!(matches!(
            payload.decode_bytes(),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn data_url_embeds_media_type() {
        let payload = ImagePayload::new("QUJD", "image/jpeg");
        assert_eq!(payload.data_url(), "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn file_extension_falls_back_for_unknown_types() {
        assert_eq!(ImagePayload::new("", "image/jpeg").file_extension(), "jpg");
        assert_eq!(ImagePayload::new("", "image/webp").file_extension(), "webp");
        assert_eq!(ImagePayload::new("", "image/x-foo").file_extension(), "img");
    }

    #[test]
    fn blocked_error_includes_reason() {
        let err = EditError::ContentBlockedOrEmpty(Some("SAFETY".into()));
        assert_eq!(
            err.to_string(),
            "the image service returned no image (SAFETY)"
        );
        let err = EditError::ContentBlockedOrEmpty(None);
        assert_eq!(err.to_string(), "the image service returned no image");
    }

    #[test]
    fn edit_error_roundtrips_through_json() {
        let err = EditError::Transport("HTTP 503".into());
        let json = serde_json::to_string(&err).unwrap();
        let back: EditError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn pipeline_error_display_names_stage() {
        let err = PipelineError::MissingInput(PipelineStage::Combine);
        assert_eq!(err.to_string(), "Try on is missing its input image");
        let err = PipelineError::NotActive {
            stage: PipelineStage::Combine,
            active: PipelineStage::ModelUpload,
        };
        assert!(err.to_string().contains("active stage: Upload model"));
    }
}
