//! Media events and the channel that carries them from the media element's
//! listeners to the player.

use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures_util::{FutureExt, StreamExt};
use std::cell::Cell;
use std::rc::Rc;

/// Counts `load()` calls on a media handle. Every event is stamped with the
/// load it was raised under.
pub type LoadId = u64;

/// Notifications raised by the playback handle.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position advanced.
    TimeUpdate,
    /// The current track played to its end.
    Ended,
    /// The browser refused to start playback (autoplay policy).
    Blocked,
    /// The track cannot be played.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StampedEvent {
    pub load: LoadId,
    pub event: MediaEvent,
}

/// Creates a connected sender/receiver pair.
pub fn media_channel() -> (MediaEventSender, MediaEvents) {
    let (tx, rx) = mpsc::unbounded();
    let sender = MediaEventSender {
        tx,
        load: Rc::new(Cell::new(0)),
    };
    (sender, MediaEvents(rx))
}

/// Clones share the load counter.
#[derive(Debug, Clone)]
pub struct MediaEventSender {
    tx: UnboundedSender<StampedEvent>,
    load: Rc<Cell<LoadId>>,
}

impl MediaEventSender {
    /// Starts a new load. Events emitted afterwards carry the returned id.
    pub fn begin_load(&self) -> LoadId {
        let next = self.load.get() + 1;
        self.load.set(next);
        next
    }

    pub fn current_load(&self) -> LoadId {
        self.load.get()
    }

    /// Queue an event for the current load. Dropped silently once the player is gone.
    pub fn emit(&self, event: MediaEvent) {
        self.emit_for(self.current_load(), event);
    }

    /// Queue an event raised under an earlier `load`, e.g. a late promise rejection.
    pub fn emit_for(&self, load: LoadId, event: MediaEvent) {
        let _ = self.tx.unbounded_send(StampedEvent { load, event });
    }
}

#[derive(Debug)]
pub struct MediaEvents(UnboundedReceiver<StampedEvent>);

impl MediaEvents {
    /// Waits for the next event; `None` after every sender is dropped.
    pub async fn next(&mut self) -> Option<StampedEvent> {
        self.0.next().await
    }

    /// Returns an already queued event without waiting.
    pub fn next_ready(&mut self) -> Option<StampedEvent> {
        self.0.next().now_or_never().flatten()
    }
}

/// Keeps listeners attached until dropped.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
