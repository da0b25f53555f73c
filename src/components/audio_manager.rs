//! Audio Manager - owns the page's audio element and turns its DOM events into
//! [`MediaEvent`]s for the player. Listeners live exactly as long as the
//! [`Subscription`] returned when they are attached.

use super::player::{NEXT_BUTTON_ID, PLAY_PAUSE_BUTTON_ID, PREV_BUTTON_ID};
use crate::error::{PlayerError, Result};
use crate::playback::{
    KeyModifiers, LoadId, MediaEvent, MediaEventSender, MediaHandle, MediaRef, Subscription,
    TransportCommand,
};
use crate::utils::{js_error_name, js_error_text};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Document, Event, EventTarget, File, HtmlAudioElement, HtmlElement, HtmlInputElement,
    KeyboardEvent, Url,
};

const AUDIO_ELEMENT_ID: &str = "local-audio-player";
const EDITABLE_SELECTOR: &str =
    "input, textarea, select, [contenteditable]:not([contenteditable='false'])";

type Listener = (&'static str, Closure<dyn FnMut(Event)>);

/// [`MediaHandle`] backed by an `HTMLAudioElement`.
pub struct WebAudioHandle {
    audio: HtmlAudioElement,
    events: MediaEventSender,
    _listeners: Subscription,
}

impl WebAudioHandle {
    /// Bind to the page's audio element, adding one to `<body>` if missing.
    pub fn attach(events: MediaEventSender) -> Result<Self> {
        let document = page_document()?;
        let audio = match document.get_element_by_id(AUDIO_ELEMENT_ID) {
            Some(existing) => existing
                .dyn_into::<HtmlAudioElement>()
                .map_err(|_| PlayerError::Unavailable("audio element"))?,
            None => {
                let audio = HtmlAudioElement::new()
                    .map_err(|err| PlayerError::Playback(js_error_text(&err)))?;
                audio.set_id(AUDIO_ELEMENT_ID);
                audio.set_preload("auto");
                document
                    .body()
                    .ok_or(PlayerError::Unavailable("document body"))?
                    .append_child(&audio)
                    .map_err(|err| PlayerError::Playback(js_error_text(&err)))?;
                audio
            }
        };
        let listeners = attach_media_listeners(&audio, &events)?;
        Ok(Self {
            audio,
            events,
            _listeners: listeners,
        })
    }

    /// False once something has removed the element from the document.
    pub fn is_connected(&self) -> bool {
        self.audio.is_connected()
    }
}

impl MediaHandle for WebAudioHandle {
    fn load(&mut self, src: &str) -> LoadId {
        let load = self.events.begin_load();
        self.audio.set_src(src);
        self.audio.load();
        load
    }

    fn play(&mut self) -> Result<()> {
        let promise = self
            .audio
            .play()
            .map_err(|err| PlayerError::Playback(js_error_text(&err)))?;
        let events = self.events.clone();
        let load = events.current_load();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                match js_error_name(&err).as_deref() {
                    Some("NotAllowedError") => events.emit_for(load, MediaEvent::Blocked),
                    // Superseded by a later load() or pause().
                    Some("AbortError") => {}
                    _ => events.emit_for(load, MediaEvent::Failed(js_error_text(&err))),
                }
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }

    fn seek(&mut self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }
}

impl Drop for WebAudioHandle {
    fn drop(&mut self) {
        let _ = self.audio.pause();
    }
}

fn attach_media_listeners(
    audio: &HtmlAudioElement,
    events: &MediaEventSender,
) -> Result<Subscription> {
    let time_events = events.clone();
    let on_time = Closure::wrap(Box::new(move |_: Event| {
        time_events.emit(MediaEvent::TimeUpdate);
    }) as Box<dyn FnMut(Event)>);

    let ended_events = events.clone();
    let on_ended = Closure::wrap(Box::new(move |_: Event| {
        ended_events.emit(MediaEvent::Ended);
    }) as Box<dyn FnMut(Event)>);

    let error_events = events.clone();
    let error_audio = audio.clone();
    let on_error = Closure::wrap(Box::new(move |_: Event| {
        if let Some(message) = media_error_message(&error_audio) {
            error_events.emit(MediaEvent::Failed(message));
        }
    }) as Box<dyn FnMut(Event)>);

    add_listeners(
        audio,
        vec![("timeupdate", on_time), ("ended", on_ended), ("error", on_error)],
    )
}

fn add_listeners(target: &EventTarget, listeners: Vec<Listener>) -> Result<Subscription> {
    for (name, callback) in &listeners {
        if let Err(err) =
            target.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
        {
            remove_listeners(target, &listeners);
            return Err(PlayerError::Playback(js_error_text(&err)));
        }
    }

    let target = target.clone();
    Ok(Subscription::new(move || remove_listeners(&target, &listeners)))
}

fn remove_listeners(target: &EventTarget, listeners: &[Listener]) {
    for (name, callback) in listeners {
        let _ = target.remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
    }
}

fn media_error_message(audio: &HtmlAudioElement) -> Option<String> {
    let audio_js = JsValue::from(audio.clone());
    let error_js = js_sys::Reflect::get(&audio_js, &"error".into()).ok()?;
    if error_js.is_null() || error_js.is_undefined() {
        return None;
    }
    let code = js_sys::Reflect::get(&error_js, &"code".into())
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0) as u16;

    Some(
        match code {
            1 => "Playback was aborted before the file loaded.",
            2 => "The file could not be read.",
            3 => "Audio playback failed due to a decode error.",
            4 => "This file format is not supported by the browser.",
            _ => "Unable to play this file.",
        }
        .to_string(),
    )
}

/// Route transport keys (media keys, space, ctrl/cmd+arrows) to the player's
/// buttons while the returned guard is alive.
pub fn attach_keyboard_shortcuts() -> Result<Subscription> {
    let document = page_document()?;

    let buttons = document.clone();
    let on_key = Closure::wrap(Box::new(move |event: Event| {
        let Ok(event) = event.dyn_into::<KeyboardEvent>() else {
            return;
        };
        if event.default_prevented() || event.is_composing() || typing_in_field(&event) {
            return;
        }
        let modifiers = KeyModifiers {
            ctrl_or_meta: event.ctrl_key() || event.meta_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
        };
        if let Some(command) = TransportCommand::from_key(&event.key(), &event.code(), modifiers) {
            event.prevent_default();
            // Same path as a mouse click.
            if let Some(button) = buttons
                .get_element_by_id(control_button_id(command))
                .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            {
                button.click();
            }
        }
    }) as Box<dyn FnMut(Event)>);

    add_listeners(&document, vec![("keydown", on_key)])
}

fn control_button_id(command: TransportCommand) -> &'static str {
    match command {
        TransportCommand::Previous => PREV_BUTTON_ID,
        TransportCommand::TogglePlay => PLAY_PAUSE_BUTTON_ID,
        TransportCommand::Next => NEXT_BUTTON_ID,
    }
}

/// The key press belongs to a form field or editable region.
fn typing_in_field(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
        .and_then(|element| element.closest(EDITABLE_SELECTOR).ok().flatten())
        .is_some()
}

fn page_document() -> Result<Document> {
    window()
        .and_then(|w| w.document())
        .ok_or(PlayerError::Unavailable("document"))
}

fn file_input(input_id: &str) -> Option<HtmlInputElement> {
    window()?
        .document()?
        .get_element_by_id(input_id)?
        .dyn_into::<HtmlInputElement>()
        .ok()
}

/// First file currently chosen in the given `<input type="file">`.
pub fn selected_file(input_id: &str) -> Option<File> {
    file_input(input_id)?.files()?.get(0)
}

/// Reset the picker so choosing the same file again fires `change`.
pub fn clear_file_input(input_id: &str) {
    if let Some(input) = file_input(input_id) {
        input.set_value("");
    }
}

/// Object URL for a selected file, valid for the lifetime of the page.
pub fn media_ref_for_file(file: &File) -> Result<MediaRef> {
    let src = Url::create_object_url_with_blob(file)
        .map_err(|err| PlayerError::MediaRef(js_error_text(&err)))?;
    Ok(MediaRef {
        src,
        name: file.name(),
    })
}
