//! Change notifications published after committed writes.

use serde::{Deserialize, Serialize};

#[cfg(feature = "emitter")]
use std::sync::{Arc, Mutex};

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
#[cfg(feature = "emitter")]
use tracing::warn;

/// Event name used for `reset`; writes use their collection name.
pub const RESET_EVENT: &str = "reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
    Reset,
}

/// Describes one committed change to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub collection: Option<String>,
    pub key: Option<String>,
}

impl ChangeEvent {
    pub fn write(kind: ChangeKind, collection: &str, key: &str) -> Self {
        Self {
            kind,
            collection: Some(collection.to_string()),
            key: Some(key.to_string()),
        }
    }

    pub fn reset() -> Self {
        Self {
            kind: ChangeKind::Reset,
            collection: None,
            key: None,
        }
    }

    /// Name listeners subscribe to: the collection name, or `reset`.
    pub fn event_name(&self) -> &str {
        self.collection.as_deref().unwrap_or(RESET_EVENT)
    }
}

/// Fans change events out to in-process listeners.
///
/// Shared between a store and the store `reset` returns, so listeners survive a reset.
#[derive(Clone)]
pub(crate) struct Notifier {
    #[cfg(feature = "emitter")]
    emitter: Arc<Mutex<EventEmitter>>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(feature = "emitter")]
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    #[cfg(feature = "emitter")]
    pub(crate) fn notify(&self, event: &ChangeEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to encode change event");
                return;
            }
        };
        match self.emitter.lock() {
            Ok(mut emitter) => {
                // Listeners run on the emitter's own threads.
                let _ = emitter.emit(event.event_name(), payload);
            }
            Err(_) => warn!(event = event.event_name(), "change emitter lock poisoned"),
        }
    }

    #[cfg(not(feature = "emitter"))]
    pub(crate) fn notify(&self, _event: &ChangeEvent) {}

    #[cfg(feature = "emitter")]
    pub(crate) fn on<F>(&self, event: &str, listener: F) -> Option<String>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let mut emitter = self.emitter.lock().ok()?;
        let id = emitter.on(event, move |payload: String| {
            match serde_json::from_str::<ChangeEvent>(&payload) {
                Ok(change) => listener(change),
                Err(err) => warn!(error = %err, "dropping undecodable change event"),
            }
        });
        Some(id)
    }

    #[cfg(feature = "emitter")]
    pub(crate) fn remove(&self, listener_id: &str) -> bool {
        match self.emitter.lock() {
            Ok(mut emitter) => emitter.remove_listener(listener_id).is_some(),
            Err(_) => false,
        }
    }
}
