use intake_types::{EngineEvent, EventKind};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    events_received: u64,
    messages_received: u64,
    decode_failures: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_event(&mut self, event: &EngineEvent) {
        self.events_received += 1;
        if event.kind() == EventKind::Message {
            self.messages_received += 1;
        }
    }

    pub(crate) fn record_decode_failure(&mut self) {
        self.decode_failures += 1;
    }

    pub fn events_received(&self) -> u64 {
        self.events_received
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }
}
