use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::components::audio_manager::{attach_keyboard_shortcuts, WebAudioHandle};
#[cfg(target_arch = "wasm32")]
use crate::components::Icon;
#[cfg(target_arch = "wasm32")]
use crate::db::{BrowserStorage, StorageKeys};
#[cfg(target_arch = "wasm32")]
use crate::error::Result;
#[cfg(target_arch = "wasm32")]
use crate::playback::{
    media_channel, MediaEventSender, PlaybackState, PlayerCore, Playlist, TransportCommand,
};
#[cfg(target_arch = "wasm32")]
use crate::utils::format_position;
#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};
#[cfg(target_arch = "wasm32")]
use tracing::{debug, error, warn};

#[cfg(target_arch = "wasm32")]
mod controls;

#[cfg(target_arch = "wasm32")]
pub(crate) use controls::{NEXT_BUTTON_ID, PLAY_PAUSE_BUTTON_ID, PREV_BUTTON_ID};
#[cfg(target_arch = "wasm32")]
use controls::{NextButton, PlayPauseButton, PrevButton};

#[cfg(target_arch = "wasm32")]
type WebPlayer = PlayerCore<WebAudioHandle, BrowserStorage>;

#[cfg(target_arch = "wasm32")]
#[derive(Clone)]
struct RunningPlayer {
    core: Rc<RefCell<WebPlayer>>,
    events: MediaEventSender,
}

/// Shared access to the running player for the transport buttons.
#[cfg(target_arch = "wasm32")]
#[derive(Clone)]
pub struct PlayerController {
    running: Option<RunningPlayer>,
    snapshot: Signal<PlaybackState>,
}

#[cfg(target_arch = "wasm32")]
impl PlayerController {
    pub fn state(&self) -> PlaybackState {
        (self.snapshot)()
    }

    pub fn is_available(&self) -> bool {
        self.running.is_some()
    }

    pub fn send(&self, command: TransportCommand) {
        self.update(|player| player.apply(command));
    }

    fn sync(&self, playlist: &Playlist) {
        self.update(|player| player.sync_playlist(playlist));
    }

    fn update(&self, op: impl FnOnce(&mut WebPlayer) -> Result<()>) {
        let Some(running) = self.running.as_ref() else {
            return;
        };
        let state = {
            let mut player = running.core.borrow_mut();
            if !player.handle().is_connected() {
                reattach(&mut player, &running.events);
            }
            if let Err(err) = op(&mut player) {
                debug!(%err, "Player operation reported an error");
            }
            player.state().clone()
        };
        let mut snapshot = self.snapshot;
        snapshot.set(state);
    }
}

/// The audio element was removed from the page; bind a fresh one and resume.
#[cfg(target_arch = "wasm32")]
fn reattach(player: &mut WebPlayer, events: &MediaEventSender) {
    warn!("Audio element left the page, attaching a new one");
    let result = WebAudioHandle::attach(events.clone())
        .and_then(|handle| player.replace_handle(handle));
    if let Err(err) = result {
        error!(%err, "Could not reattach the audio element");
    }
}

/// Create the engine and start the task that feeds it media events.
#[cfg(target_arch = "wasm32")]
fn start_player(snapshot: Signal<PlaybackState>) -> Result<RunningPlayer> {
    let (sender, mut events) = media_channel();
    let handle = WebAudioHandle::attach(sender.clone())?;
    let core = Rc::new(RefCell::new(PlayerCore::new(
        handle,
        BrowserStorage,
        StorageKeys::default(),
    )));

    let task_core = core.clone();
    let mut snapshot = snapshot;
    spawn(async move {
        while let Some(event) = events.next().await {
            let state = {
                let mut player = task_core.borrow_mut();
                let first = player.dispatch(event);
                let rest = player.pump(&mut events);
                if let Err(err) = first.and(rest) {
                    debug!(%err, "Media event reported an error");
                }
                player.state().clone()
            };
            if *snapshot.peek() != state {
                snapshot.set(state);
            }
        }
    });

    Ok(RunningPlayer {
        core,
        events: sender,
    })
}

#[cfg(target_arch = "wasm32")]
#[component]
pub fn Player() -> Element {
    let playlist = use_context::<Signal<Playlist>>();
    let snapshot = use_signal(PlaybackState::default);

    let controller = use_hook(move || {
        let running = match start_player(snapshot) {
            Ok(running) => Some(running),
            Err(err) => {
                error!(%err, "Audio player could not start");
                None
            }
        };
        PlayerController { running, snapshot }
    });
    use_context_provider(|| controller.clone());

    // Detached when the player unmounts.
    let _shortcuts = use_hook(|| match attach_keyboard_shortcuts() {
        Ok(guard) => Some(Rc::new(guard)),
        Err(err) => {
            warn!(%err, "Keyboard shortcuts unavailable");
            None
        }
    });

    {
        let controller = controller.clone();
        use_effect(move || {
            let list = playlist();
            controller.sync(&list);
        });
    }

    let state = snapshot();
    let list = playlist();
    let now_playing = list
        .get(state.current_index)
        .map(|entry| entry.name.clone())
        .unwrap_or_default();
    let position = format_position(state.position);

    if !controller.is_available() {
        return rsx! {
            div { class: "player-error", "Audio playback is not available in this browser." }
        };
    }

    rsx! {
        if let Some(message) = state.error.clone() {
            div { class: "player-error", role: "alert", "{message}" }
        }
        section { class: "player",
            div { class: "now-playing",
                Icon { name: "music".to_string(), class: "icon".to_string() }
                h2 { class: "now-playing-title", "Now Playing: {now_playing}" }
                span { class: "now-playing-position", "{position}" }
            }
            div { class: "player-controls",
                PrevButton {}
                PlayPauseButton {}
                NextButton {}
            }
            ol { class: "playlist",
                for (index, entry) in list.entries().iter().enumerate() {
                    li {
                        key: "{index}",
                        class: if index == state.current_index { "playlist-entry current" } else { "playlist-entry" },
                        "{entry.name}"
                    }
                }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn Player() -> Element {
    rsx! {
        div { class: "player-error", "Audio playback requires a browser." }
    }
}
