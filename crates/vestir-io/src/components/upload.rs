//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use vestir_pipeline::SourceFile;

/// Allowed file extensions for image uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif"];

/// Check whether a filename has an allowed image extension.
fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Build the [`SourceFile`] for a read file.
///
/// The media type reported by the browser is kept as-is; an empty report
/// leaves the type for the codec to detect.
fn source_file(name: String, content_type: Option<String>, bytes: Vec<u8>) -> SourceFile {
    match content_type.filter(|t| !t.is_empty()) {
        Some(media_type) => SourceFile::new(name, media_type, bytes),
        None => SourceFile::undeclared(name, bytes),
    }
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Whether the picker accepts files right now.
    enabled: bool,
    /// Called with the file once its bytes have been read.
    on_select: EventHandler<SourceFile>,
}

/// A drag-and-drop zone with a file picker button.
///
/// Reads the first selected file and fires `on_select` with the media
/// type the browser reported. Files the browser cannot type are passed
/// on undeclared.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let enabled = props.enabled;

    // Shared by the picker and the drop zone.
    let process_files = move |files: Vec<FileData>| async move {
        if !enabled {
            return;
        }
        let Some(file) = files.first() else {
            return;
        };
        let name = file.name();
        let content_type = file.content_type();
        if !has_allowed_extension(&name) {
            error.set(Some(format!("Unsupported file type: {name}")));
            return;
        }
        match file.read_bytes().await {
            Ok(bytes) => {
                error.set(None);
                props
                    .on_select
                    .call(source_file(name, content_type, bytes.to_vec()));
            }
            Err(e) => {
                error.set(Some(format!("Failed to read file: {e}")));
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let zone_class = match (enabled, dragging()) {
        (false, _) => "upload upload-disabled",
        (true, true) => "upload upload-dragging",
        (true, false) => "upload",
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                if enabled {
                    dragging.set(true);
                }
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref err) = error() {
                p { class: "text-error", "{err}" }
            }

            p { class: "text-secondary", "Drop an image here or " }

            label {
                class: "btn btn-primary",
                input {
                    r#type: "file",
                    accept: ".png,.jpg,.jpeg,.bmp,.webp,.gif",
                    class: "hidden",
                    disabled: !enabled,
                    onchange: handle_files,
                }
                "Choose File"
            }

            p { class: "text-muted text-small", "PNG, JPEG, BMP, WebP, GIF" }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("ME.JPG"));
        assert!(has_allowed_extension("shirt.webp"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("no-extension"));
    }

    #[test]
    fn reported_type_is_kept_even_when_bytes_disagree() {
        // WebP magic bytes behind a name and a report that both say JPEG.
        let bytes = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        let file = source_file("photo.jpg".into(), Some("image/jpeg".into()), bytes);
        assert_eq!(file.media_type.as_deref(), Some("image/jpeg"));

        let payload = vestir_pipeline::codec::encode(&file).unwrap();
        assert_eq!(payload.media_type, "image/jpeg");
    }

    #[test]
    fn missing_or_empty_report_is_undeclared() {
        let none = source_file("a.png".into(), None, vec![1]);
        assert_eq!(none.media_type, None);
        let empty = source_file("a.png".into(), Some(String::new()), vec![1]);
        assert_eq!(empty.media_type, None);
    }
}
