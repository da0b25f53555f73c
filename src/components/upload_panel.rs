use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::components::audio_manager::{clear_file_input, media_ref_for_file, selected_file};
#[cfg(target_arch = "wasm32")]
use crate::components::Icon;
#[cfg(target_arch = "wasm32")]
use crate::playback::{Playlist, Uploader};
#[cfg(target_arch = "wasm32")]
use tracing::{debug, info, warn};

#[cfg(target_arch = "wasm32")]
const UPLOAD_INPUT_ID: &str = "upload-input";

/// File picker plus an Upload button that appends the chosen file to the playlist.
#[cfg(target_arch = "wasm32")]
#[component]
pub fn UploadPanel() -> Element {
    let mut playlist = use_context::<Signal<Playlist>>();
    let mut uploader = use_signal(Uploader::<web_sys::File>::default);
    let mut upload_error = use_signal(|| None::<String>);

    let pending_name = uploader.read().pending().map(|file| file.name());

    let on_change = move |_: Event<FormData>| {
        uploader.write().select(selected_file(UPLOAD_INPUT_ID));
        upload_error.set(None);
    };

    let on_upload = move |_| {
        let result = uploader
            .write()
            .confirm(&mut playlist.write(), media_ref_for_file);
        match result {
            Ok(true) => {
                clear_file_input(UPLOAD_INPUT_ID);
                info!(tracks = playlist.peek().len(), "Added track to playlist");
            }
            Ok(false) => debug!("Upload pressed with no file selected"),
            Err(err) => {
                warn!(%err, "Could not add file to playlist");
                upload_error.set(Some(err.to_string()));
            }
        }
    };

    rsx! {
        section { class: "upload-panel",
            input {
                id: UPLOAD_INPUT_ID,
                r#type: "file",
                class: "upload-input",
                onchange: on_change,
            }
            button {
                id: "upload-btn",
                r#type: "button",
                class: "control-button",
                onclick: on_upload,
                Icon { name: "upload".to_string(), class: "icon".to_string() }
                span { "Upload" }
            }
            if let Some(name) = pending_name {
                span { class: "upload-pending", "Selected: {name}" }
            }
            if let Some(message) = upload_error() {
                div { class: "player-error", role: "alert", "{message}" }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn UploadPanel() -> Element {
    rsx! {
        section { class: "upload-panel", "Uploading files requires a browser." }
    }
}
