use crate::components::{Player, UploadPanel};
use crate::playback::Playlist;
use dioxus::prelude::*;

#[component]
pub fn AppShell() -> Element {
    let playlist = use_signal(Playlist::default);

    // Provide state via context
    use_context_provider(|| playlist);

    let has_tracks = !playlist.read().is_empty();

    rsx! {
        main { class: "app-shell",
            h1 { class: "app-title", "Audio Player" }
            UploadPanel {}
            if has_tracks {
                Player {}
            } else {
                p { class: "player-idle", "Upload an audio file to start playing." }
            }
        }
    }
}
