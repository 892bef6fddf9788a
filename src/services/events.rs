// Change notification for settings observers

use serde::Serialize;
use serde_json::Value;

pub const SETTINGS_CHANGED_EVENT: &str = "settings_changed";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => log::warn!("Failed to serialize '{event}' payload: {e}"),
    }
}

#[cfg(test)]
pub use recording::RecordingEventSink;

#[cfg(test)]
mod recording {
    use std::sync::Mutex;

    use serde_json::Value;

    use super::EventSink;

    /// Keeps every emitted event in memory, in order
    #[derive(Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<(String, Value)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingEventSink {
        fn emit(&self, event: &str, payload: Value) {
            self.events.lock().unwrap().push((event.to_string(), payload));
        }
    }
}
