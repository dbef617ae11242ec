//! Horizontal strip of saved try-on results.
//!
//! Each tile shows one album entry with download and delete buttons.
//! Entries are addressed by position; the strip re-renders from the
//! album after every change.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdDownload, LdTrash2};
use vestir_pipeline::{ImagePayload, Intent};

/// Props for the [`Album`] component.
#[derive(Props, Clone, PartialEq)]
pub struct AlbumProps {
    /// Saved results, oldest first.
    entries: Vec<ImagePayload>,
    /// Called with download and delete requests.
    on_intent: EventHandler<Intent>,
}

/// Scrollable strip of saved results.
#[component]
pub fn Album(props: AlbumProps) -> Element {
    let count = props.entries.len();

    rsx! {
        section { class: "album", aria_label: "Saved looks",
            h2 { class: "album-title", "Saved looks ({count})" }

            if props.entries.is_empty() {
                p { class: "text-placeholder",
                    "Saved results appear here."
                }
            } else {
                div { class: "album-strip",
                    for (index, entry) in props.entries.iter().enumerate() {
                        {render_tile(index, entry, props.on_intent)}
                    }
                }
            }
        }
    }
}

/// Render a single album tile.
fn render_tile(index: usize, entry: &ImagePayload, on_intent: EventHandler<Intent>) -> Element {
    let number = index + 1;

    rsx! {
        figure { class: "album-tile", key: "{index}",
            img {
                src: "{entry.data_url()}",
                alt: "Saved look {number}",
            }
            figcaption { class: "album-actions",
                button {
                    class: "btn btn-icon",
                    title: "Download",
                    aria_label: "Download saved look {number}",
                    onclick: move |_| on_intent.call(Intent::DownloadAlbumEntry(index)),
                    Icon { width: 16, height: 16, icon: LdDownload }
                }
                button {
                    class: "btn btn-icon btn-danger",
                    title: "Delete",
                    aria_label: "Delete saved look {number}",
                    onclick: move |_| on_intent.call(Intent::DeleteAlbumEntry(index)),
                    Icon { width: 16, height: 16, icon: LdTrash2 }
                }
            }
        }
    }
}
