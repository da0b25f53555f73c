//! Player engine - owns the playback handle and the current position in the
//! playlist. Browser specifics live behind [`MediaHandle`] and
//! [`KeyValueStore`] so the rules here run the same in tests and in the page.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod events;
mod playlist;
mod transport;

pub use events::*;
pub use playlist::*;
pub use transport::*;

use crate::db::{KeyValueStore, PersistedState, StorageKeys};
use crate::error::{PlayerError, Result};
use tracing::{debug, error, info, trace, warn};

/// The native object that decodes and renders audio.
pub trait MediaHandle {
    /// Point the handle at a new source, resetting position. Returns the id
    /// stamped on events raised for this source.
    fn load(&mut self, src: &str) -> LoadId;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    /// Nothing loaded yet. Left on the first track load and never re-entered.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of the player for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub current_index: usize,
    pub status: PlayerStatus,
    /// Last known position in seconds.
    pub position: f64,
    /// Message for the last unrecoverable playback failure.
    pub error: Option<String>,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }
}

pub struct PlayerCore<H, S> {
    handle: H,
    store: S,
    keys: StorageKeys,
    playlist: Playlist,
    state: PlaybackState,
    load_id: LoadId,
    initialized: bool,
}

impl<H: MediaHandle, S: KeyValueStore> PlayerCore<H, S> {
    pub fn new(handle: H, store: S, keys: StorageKeys) -> Self {
        Self {
            handle,
            store,
            keys,
            playlist: Playlist::default(),
            state: PlaybackState::default(),
            load_id: 0,
            initialized: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn current_entry(&self) -> Option<&MediaRef> {
        self.playlist.get(self.state.current_index)
    }

    /// Take the latest playlist. The first non-empty playlist restores the
    /// saved position and starts playback; later appends leave the current
    /// track alone.
    pub fn sync_playlist(&mut self, playlist: &Playlist) -> Result<()> {
        self.playlist = playlist.clone();
        if self.initialized || self.playlist.is_empty() {
            return Ok(());
        }
        self.initialized = true;

        let resume = PersistedState::load(&self.store, &self.keys)
            .filter(|saved| saved.last_played_track < self.playlist.len());
        match resume {
            Some(saved) => {
                info!(
                    track = saved.last_played_track,
                    time = saved.last_played_time,
                    "Resuming last played track"
                );
                self.change_track(saved.last_played_track, saved.last_played_time)
            }
            None => {
                debug!("No usable saved position, starting from the first track");
                self.change_track(0, 0.0)
            }
        }
    }

    pub fn toggle(&mut self) -> Result<()> {
        match self.state.status {
            PlayerStatus::Playing => {
                self.handle.pause();
                self.state.status = PlayerStatus::Paused;
                Ok(())
            }
            PlayerStatus::Paused => self.start_playback(),
            PlayerStatus::Stopped => Ok(()),
        }
    }

    pub fn skip(&mut self, direction: SkipDirection) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let next = wrap_index(
            self.state.current_index,
            direction.offset(),
            self.playlist.len(),
        );
        self.change_track(next, 0.0)
    }

    pub fn apply(&mut self, command: TransportCommand) -> Result<()> {
        match command {
            TransportCommand::Previous => self.skip(SkipDirection::Previous),
            TransportCommand::TogglePlay => self.toggle(),
            TransportCommand::Next => self.skip(SkipDirection::Next),
        }
    }

    /// React to a notification from the handle.
    pub fn handle_event(&mut self, event: MediaEvent) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        match event {
            MediaEvent::TimeUpdate => {
                self.save_position();
                Ok(())
            }
            MediaEvent::Ended => {
                // Persist the finished position before moving on.
                self.save_position();
                let next = wrap_index(self.state.current_index, 1, self.playlist.len());
                self.change_track(next, 0.0)
            }
            MediaEvent::Blocked => {
                warn!("Browser blocked playback until the user interacts");
                self.state.status = PlayerStatus::Paused;
                Ok(())
            }
            MediaEvent::Failed(message) => self.fail(message),
        }
    }

    /// Like [`Self::handle_event`], but drops events raised for a source that
    /// has since been replaced, so a queued `Ended` cannot skip the next track.
    pub fn dispatch(&mut self, stamped: StampedEvent) -> Result<()> {
        if stamped.load != self.load_id {
            trace!(
                load = stamped.load,
                current = self.load_id,
                event = ?stamped.event,
                "Dropping event from a superseded load"
            );
            return Ok(());
        }
        self.handle_event(stamped.event)
    }

    /// Dispatch every event already queued on `events`. All events are
    /// dispatched; the first failure is returned.
    pub fn pump(&mut self, events: &mut MediaEvents) -> Result<()> {
        let mut first_error = None;
        while let Some(event) = events.next_ready() {
            if let Err(err) = self.dispatch(event) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Swap in a new handle. The old one is dropped, detaching its listeners,
    /// and the current track is reloaded at the last known position.
    pub fn replace_handle(&mut self, handle: H) -> Result<()> {
        drop(std::mem::replace(&mut self.handle, handle));
        if !self.is_active() {
            return Ok(());
        }
        self.change_track(self.state.current_index, self.state.position)
    }

    fn is_active(&self) -> bool {
        self.initialized && !self.playlist.is_empty()
    }

    fn change_track(&mut self, index: usize, start_at: f64) -> Result<()> {
        let Some(entry) = self.playlist.get(index) else {
            return Ok(());
        };
        info!(index, name = %entry.name, "Loading track");
        self.load_id = self.handle.load(&entry.src);
        if start_at > 0.0 {
            self.handle.seek(start_at);
        }

        self.state.current_index = index;
        self.state.position = start_at;
        self.state.error = None;
        self.start_playback()
    }

    fn start_playback(&mut self) -> Result<()> {
        match self.handle.play() {
            Ok(()) => {
                self.state.status = PlayerStatus::Playing;
                Ok(())
            }
            Err(PlayerError::Playback(message)) => self.fail(message),
            Err(other) => self.fail(other.to_string()),
        }
    }

    fn fail(&mut self, message: String) -> Result<()> {
        error!(index = self.state.current_index, %message, "Playback failed");
        self.state.status = PlayerStatus::Paused;
        self.state.error = Some(message.clone());
        Err(PlayerError::Playback(message))
    }

    fn save_position(&mut self) {
        let time = self.handle.current_time();
        self.state.position = time;
        let saved = PersistedState {
            last_played_track: self.state.current_index,
            last_played_time: time,
        };
        trace!(track = saved.last_played_track, time, "Saving playback position");
        if let Err(err) = saved.save(&mut self.store, &self.keys) {
            warn!(%err, "Could not persist playback position");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct FakeHandle {
        events: MediaEventSender,
        journal: Journal,
        time: Rc<Cell<f64>>,
        fail_play: bool,
        _listeners: Subscription,
    }

    impl FakeHandle {
        fn attach(
            events: &MediaEventSender,
            journal: &Journal,
            time: &Rc<Cell<f64>>,
            attached: &Rc<Cell<i32>>,
        ) -> Self {
            attached.set(attached.get() + 1);
            let attached = attached.clone();
            Self {
                events: events.clone(),
                journal: journal.clone(),
                time: time.clone(),
                fail_play: false,
                _listeners: Subscription::new(move || attached.set(attached.get() - 1)),
            }
        }
    }

    impl MediaHandle for FakeHandle {
        fn load(&mut self, src: &str) -> LoadId {
            self.time.set(0.0);
            self.journal.borrow_mut().push(format!("load {src}"));
            self.events.begin_load()
        }

        fn play(&mut self) -> Result<()> {
            self.journal.borrow_mut().push("play".to_string());
            if self.fail_play {
                return Err(PlayerError::Playback("NotSupportedError".to_string()));
            }
            Ok(())
        }

        fn pause(&mut self) {
            self.journal.borrow_mut().push("pause".to_string());
        }

        fn seek(&mut self, seconds: f64) {
            self.time.set(seconds);
            self.journal.borrow_mut().push(format!("seek {seconds}"));
        }

        fn current_time(&self) -> f64 {
            self.time.get()
        }
    }

    struct Harness {
        core: PlayerCore<FakeHandle, MemoryStore>,
        sender: MediaEventSender,
        events: MediaEvents,
        journal: Journal,
        time: Rc<Cell<f64>>,
        attached: Rc<Cell<i32>>,
    }

    impl Harness {
        fn new(saved: &[(&str, &str)]) -> Self {
            let journal: Journal = Rc::default();
            let time = Rc::new(Cell::new(0.0));
            let attached = Rc::new(Cell::new(0));
            let mut store = MemoryStore::with_values(saved);
            store.journal = Some(journal.clone());
            let (sender, events) = media_channel();
            let handle = FakeHandle::attach(&sender, &journal, &time, &attached);
            Self {
                core: PlayerCore::new(handle, store, StorageKeys::default()),
                sender,
                events,
                journal,
                time,
                attached,
            }
        }

        fn started(names: &[&str]) -> Self {
            let mut harness = Self::new(&[]);
            harness.core.sync_playlist(&playlist(names)).unwrap();
            harness.journal.borrow_mut().clear();
            harness
        }

        fn take_journal(&self) -> Vec<String> {
            std::mem::take(&mut *self.journal.borrow_mut())
        }

        fn stored(&self, key: &str) -> Option<String> {
            self.core.store.get(key)
        }
    }

    fn playlist(names: &[&str]) -> Playlist {
        names
            .iter()
            .map(|name| MediaRef {
                src: format!("blob:{name}"),
                name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn first_playlist_starts_first_track_without_saved_state() {
        let mut h = Harness::new(&[]);
        assert_eq!(h.core.state().status, PlayerStatus::Stopped);

        h.core.sync_playlist(&playlist(&["a"])).unwrap();

        assert_eq!(h.take_journal(), vec!["load blob:a", "play"]);
        assert_eq!(h.core.state().current_index, 0);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn empty_playlist_does_not_initialize() {
        let mut h = Harness::new(&[("lastPlayedTrack", "0")]);

        h.core.sync_playlist(&Playlist::default()).unwrap();
        h.core.toggle().unwrap();
        h.core.skip(SkipDirection::Next).unwrap();
        h.core.handle_event(MediaEvent::Ended).unwrap();
        h.core.handle_event(MediaEvent::TimeUpdate).unwrap();

        assert!(h.take_journal().is_empty());
        assert_eq!(h.core.state().status, PlayerStatus::Stopped);
    }

    #[test]
    fn restores_valid_saved_track_and_time() {
        let mut h = Harness::new(&[("lastPlayedTrack", "1"), ("lastPlayedTime", "42.5")]);

        h.core.sync_playlist(&playlist(&["a", "b", "c"])).unwrap();

        assert_eq!(h.take_journal(), vec!["load blob:b", "seek 42.5", "play"]);
        assert_eq!(h.core.state().current_index, 1);
        assert_eq!(h.core.state().position, 42.5);
        assert_eq!(h.core.current_entry().map(|e| e.name.as_str()), Some("b"));
    }

    #[test]
    fn out_of_range_saved_track_starts_over() {
        let mut h = Harness::new(&[("lastPlayedTrack", "5"), ("lastPlayedTime", "42.5")]);

        h.core.sync_playlist(&playlist(&["a", "b"])).unwrap();

        assert_eq!(h.take_journal(), vec!["load blob:a", "play"]);
        assert_eq!(h.core.state().current_index, 0);
        assert_eq!(h.core.state().position, 0.0);
    }

    #[test]
    fn appending_tracks_keeps_current_track_playing() {
        let mut h = Harness::started(&["a"]);

        h.core.sync_playlist(&playlist(&["a", "b"])).unwrap();

        assert!(h.take_journal().is_empty());
        assert_eq!(h.core.state().current_index, 0);
        h.core.skip(SkipDirection::Next).unwrap();
        assert_eq!(h.core.current_entry().map(|e| e.name.as_str()), Some("b"));
    }

    #[test]
    fn next_from_last_track_wraps_to_first_and_plays() {
        let mut h = Harness::started(&["a", "b", "c"]);
        h.core.skip(SkipDirection::Next).unwrap();
        h.core.skip(SkipDirection::Next).unwrap();
        assert_eq!(h.core.state().current_index, 2);
        h.take_journal();

        h.core.skip(SkipDirection::Next).unwrap();

        assert_eq!(h.core.state().current_index, 0);
        assert_eq!(h.take_journal(), vec!["load blob:a", "play"]);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn previous_from_first_track_wraps_to_last() {
        let mut h = Harness::started(&["a", "b", "c"]);

        h.core.apply(TransportCommand::Previous).unwrap();

        assert_eq!(h.core.state().current_index, 2);
        assert_eq!(h.take_journal(), vec!["load blob:c", "play"]);
    }

    #[test]
    fn toggle_pauses_and_resumes_without_reloading() {
        let mut h = Harness::started(&["a", "b", "c"]);
        h.core.skip(SkipDirection::Next).unwrap();
        h.take_journal();

        h.core.toggle().unwrap();
        assert_eq!(h.core.state().current_index, 1);
        assert!(!h.core.state().is_playing());
        assert_eq!(h.core.state().status, PlayerStatus::Paused);
        assert_eq!(h.take_journal(), vec!["pause"]);

        h.core.apply(TransportCommand::TogglePlay).unwrap();
        assert!(h.core.state().is_playing());
        assert_eq!(h.take_journal(), vec!["play"]);
    }

    #[test]
    fn skip_while_paused_starts_playing() {
        let mut h = Harness::started(&["a", "b"]);
        h.core.toggle().unwrap();

        h.core.skip(SkipDirection::Next).unwrap();

        assert_eq!(h.core.state().status, PlayerStatus::Playing);
    }

    #[test]
    fn time_update_persists_every_tick() {
        let mut h = Harness::started(&["a", "b"]);
        h.core.skip(SkipDirection::Next).unwrap();
        h.take_journal();

        h.time.set(1.5);
        h.core.handle_event(MediaEvent::TimeUpdate).unwrap();
        h.time.set(1.75);
        h.core.handle_event(MediaEvent::TimeUpdate).unwrap();

        assert_eq!(
            h.take_journal(),
            vec![
                "set lastPlayedTrack=1",
                "set lastPlayedTime=1.5",
                "set lastPlayedTrack=1",
                "set lastPlayedTime=1.75",
            ]
        );
        assert_eq!(h.core.state().position, 1.75);
    }

    #[test]
    fn ended_saves_finished_position_before_advancing() {
        let mut h = Harness::started(&["a", "b", "c"]);
        h.core.skip(SkipDirection::Next).unwrap();
        h.take_journal();
        h.time.set(180.0);

        h.core.handle_event(MediaEvent::Ended).unwrap();

        assert_eq!(
            h.take_journal(),
            vec![
                "set lastPlayedTrack=1",
                "set lastPlayedTime=180",
                "load blob:c",
                "play",
            ]
        );
        assert_eq!(h.stored("lastPlayedTrack").as_deref(), Some("1"));
        assert_eq!(h.core.state().current_index, 2);
    }

    #[test]
    fn ended_on_last_track_loops_to_first() {
        let mut h = Harness::started(&["a", "b"]);
        h.core.skip(SkipDirection::Next).unwrap();

        h.core.handle_event(MediaEvent::Ended).unwrap();

        assert_eq!(h.core.state().current_index, 0);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn single_track_restarts_on_end() {
        let mut h = Harness::started(&["a"]);

        h.core.handle_event(MediaEvent::Ended).unwrap();

        assert_eq!(h.core.state().current_index, 0);
        assert!(h.take_journal().ends_with(&["load blob:a".to_string(), "play".to_string()]));
    }

    #[test]
    fn storage_failure_does_not_interrupt_playback() {
        let mut h = Harness::started(&["a", "b"]);
        h.core.store.fail_writes = true;

        h.core.handle_event(MediaEvent::TimeUpdate).unwrap();
        h.core.handle_event(MediaEvent::Ended).unwrap();

        assert_eq!(h.core.state().current_index, 1);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn failed_media_is_reported_until_next_track() {
        let mut h = Harness::started(&["a", "b"]);

        let err = h
            .core
            .handle_event(MediaEvent::Failed("decode error".to_string()))
            .unwrap_err();

        assert_eq!(err, PlayerError::Playback("decode error".to_string()));
        assert_eq!(h.core.state().error.as_deref(), Some("decode error"));
        assert_eq!(h.core.state().status, PlayerStatus::Paused);

        h.core.skip(SkipDirection::Next).unwrap();
        assert_eq!(h.core.state().error, None);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn rejected_play_call_surfaces_error() {
        let mut h = Harness::new(&[]);
        h.core.handle.fail_play = true;

        let result = h.core.sync_playlist(&playlist(&["a"]));

        assert!(matches!(result, Err(PlayerError::Playback(_))));
        assert_eq!(h.core.state().error.as_deref(), Some("NotSupportedError"));
        assert!(!h.core.state().is_playing());
    }

    #[test]
    fn blocked_autoplay_pauses_without_error() {
        let mut h = Harness::started(&["a"]);

        h.core.handle_event(MediaEvent::Blocked).unwrap();

        assert_eq!(h.core.state().status, PlayerStatus::Paused);
        assert_eq!(h.core.state().error, None);
    }

    #[test]
    fn pump_applies_queued_events_in_order() {
        let mut h = Harness::started(&["a", "b", "c"]);
        h.time.set(3.0);
        h.sender.emit(MediaEvent::TimeUpdate);
        h.sender.emit(MediaEvent::Ended);

        h.core.pump(&mut h.events).unwrap();

        assert_eq!(
            h.take_journal(),
            vec![
                "set lastPlayedTrack=0",
                "set lastPlayedTime=3",
                "set lastPlayedTrack=0",
                "set lastPlayedTime=3",
                "load blob:b",
                "play",
            ]
        );
        assert_eq!(h.core.state().current_index, 1);
        assert_eq!(h.events.next_ready(), None);
    }

    #[test]
    fn queued_end_of_skipped_track_does_not_advance_again() {
        let mut h = Harness::started(&["a", "b", "c"]);
        h.sender.emit(MediaEvent::Ended);

        h.core.skip(SkipDirection::Next).unwrap();
        h.core.pump(&mut h.events).unwrap();

        assert_eq!(h.core.state().current_index, 1);
        assert_eq!(h.take_journal(), vec!["load blob:b", "play"]);

        h.sender.emit(MediaEvent::Ended);
        h.core.pump(&mut h.events).unwrap();
        assert_eq!(h.core.state().current_index, 2);
    }

    #[test]
    fn late_failure_of_previous_track_is_ignored() {
        let mut h = Harness::started(&["a", "b"]);
        let first_load = h.sender.current_load();
        h.core.skip(SkipDirection::Next).unwrap();

        h.sender
            .emit_for(first_load, MediaEvent::Failed("decode error".to_string()));
        h.core.pump(&mut h.events).unwrap();

        assert_eq!(h.core.state().error, None);
        assert!(h.core.state().is_playing());
    }

    #[test]
    fn pump_keeps_going_after_a_failure() {
        let mut h = Harness::started(&["a", "b"]);
        h.sender.emit(MediaEvent::Failed("network".to_string()));
        h.sender.emit(MediaEvent::Ended);

        let result = h.core.pump(&mut h.events);

        assert_eq!(result, Err(PlayerError::Playback("network".to_string())));
        assert_eq!(h.core.state().current_index, 1);
        assert_eq!(h.core.state().error, None);
    }

    #[test]
    fn replacing_handle_detaches_old_listeners() {
        let mut h = Harness::started(&["a", "b"]);
        assert_eq!(h.attached.get(), 1);
        h.time.set(12.0);
        h.core.handle_event(MediaEvent::TimeUpdate).unwrap();
        h.take_journal();

        h.sender.emit(MediaEvent::Ended);

        let replacement = FakeHandle::attach(&h.sender, &h.journal, &h.time, &h.attached);
        h.core.replace_handle(replacement).unwrap();

        assert_eq!(h.attached.get(), 1);
        assert_eq!(h.take_journal(), vec!["load blob:a", "seek 12", "play"]);

        // The end of the load on the old handle no longer applies.
        h.core.pump(&mut h.events).unwrap();
        assert_eq!(h.core.state().current_index, 0);

        drop(h.core);
        assert_eq!(h.attached.get(), 0);
    }

    proptest::proptest! {
        #[test]
        fn current_index_stays_in_range(len in 1usize..12, ops in proptest::collection::vec(0u8..5, 1..200)) {
            let names: Vec<String> = (0..len).map(|n| format!("t{n}")).collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut h = Harness::started(&names);

            for op in ops {
                let _ = match op {
                    0 => h.core.skip(SkipDirection::Next),
                    1 => h.core.skip(SkipDirection::Previous),
                    2 => h.core.toggle(),
                    3 => h.core.handle_event(MediaEvent::Ended),
                    _ => h.core.handle_event(MediaEvent::TimeUpdate),
                };
                proptest::prop_assert!(h.core.state().current_index < len);
                proptest::prop_assert!(h.core.current_entry().is_some());
            }
        }
    }
}
