use super::PlayerController;
use crate::components::Icon;
use crate::playback::TransportCommand;
use dioxus::prelude::*;

pub(crate) const PREV_BUTTON_ID: &str = "prev-btn";
pub(crate) const PLAY_PAUSE_BUTTON_ID: &str = "play-pause-btn";
pub(crate) const NEXT_BUTTON_ID: &str = "next-btn";

/// Play/Pause button
#[component]
pub(super) fn PlayPauseButton() -> Element {
    let controller = use_context::<PlayerController>();
    let playing = controller.state().is_playing();
    let label = if playing { "Pause" } else { "Play" };

    rsx! {
        button {
            id: PLAY_PAUSE_BUTTON_ID,
            r#type: "button",
            class: "control-button control-button-primary",
            aria_label: label,
            onclick: move |_| controller.send(TransportCommand::TogglePlay),
            if playing {
                Icon { name: "pause".to_string(), class: "icon".to_string() }
            } else {
                Icon { name: "play".to_string(), class: "icon".to_string() }
            }
            span { "{label}" }
        }
    }
}

#[component]
pub(super) fn PrevButton() -> Element {
    let controller = use_context::<PlayerController>();

    rsx! {
        button {
            id: PREV_BUTTON_ID,
            r#type: "button",
            class: "control-button",
            aria_label: "Previous",
            onclick: move |_| controller.send(TransportCommand::Previous),
            Icon { name: "prev".to_string(), class: "icon".to_string() }
            span { "Previous" }
        }
    }
}

#[component]
pub(super) fn NextButton() -> Element {
    let controller = use_context::<PlayerController>();

    rsx! {
        button {
            id: NEXT_BUTTON_ID,
            r#type: "button",
            class: "control-button",
            aria_label: "Next",
            onclick: move |_| controller.send(TransportCommand::Next),
            Icon { name: "next".to_string(), class: "icon".to_string() }
            span { "Next" }
        }
    }
}
