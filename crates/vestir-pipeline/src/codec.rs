//! Image codec: user file in, transport-ready [`ImagePayload`] out.
//!
//! No pixels are decoded here. The bytes are base64-encoded as-is and
//! the media type is taken from the source, falling back to magic-byte
//! detection and then to the file extension.

use std::path::Path;

use image::ImageFormat;

use crate::types::{CodecError, ImagePayload, SourceFile};

/// Encode a user-selected file into an [`ImagePayload`].
///
/// A declared media type is preserved exactly. Without one, the type is
/// detected from the leading bytes, then from the file extension.
///
/// # Errors
///
/// Returns [`CodecError::EmptyInput`] if the file has no bytes.
/// Returns [`CodecError::NotAnImage`] if the declared type is not an
/// `image/*` type.
/// Returns [`CodecError::UnknownMediaType`] if no type is declared and
/// none can be detected.
pub fn encode(file: &SourceFile) -> Result<ImagePayload, CodecError> {
    if file.bytes.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let media_type = resolve_media_type(file)?;
    Ok(ImagePayload::from_bytes(&file.bytes, media_type))
}

/// Determine the media type for `file` without encoding it.
fn resolve_media_type(file: &SourceFile) -> Result<String, CodecError> {
    match file.media_type.as_deref() {
        Some(declared) if !declared.trim().is_empty() => {
            if declared.trim_start().starts_with("image/") {
                Ok(declared.to_owned())
            } else {
                Err(CodecError::NotAnImage(declared.to_owned()))
            }
        }
        _ => sniff(&file.bytes)
            .or_else(|| from_extension(&file.name))
            .map(str::to_owned)
            .ok_or_else(|| CodecError::UnknownMediaType(file.name.clone())),
    }
}

/// Detect the media type from the leading magic bytes.
fn sniff(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// Guess the media type from the file extension.
fn from_extension(name: &str) -> Option<&'static str> {
    Path::new(name)
        .extension()
        .and_then(ImageFormat::from_extension)
        .map(|f| f.to_mime_type())
}
