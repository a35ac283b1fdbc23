//! Change notifications for anything presenting annotations.
//!
//! The tracker publishes here after it has persisted changes. Decorations,
//! tree views, or an editor bridge subscribe and refresh themselves; the
//! tracker never waits on them.

use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Annotations on this file were repositioned.
    AnnotationsChanged { path: PathBuf },
    /// Annotations moved from `old` to `new`.
    PathRenamed { old: PathBuf, new: PathBuf },
    /// The store was reloaded from changes made by another process.
    StoreReloaded,
}

/// Fan-out of tracker events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<TrackerEvent>,
}

impl NotificationBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: TrackerEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
