use crate::Input;
use anyhow::Result;
use async_trait::async_trait;
use intake_types::{AssistantOptions, AssistantOverrides, EngineEvent, EventKind};
#[cfg(test)]
use mockall::automock;
use std::collections::BTreeSet;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A trait abstracting the real-time voice engine.
/// The engine does speech recognition, synthesis and the conversation itself;
/// this crate only starts it, stops it, and listens to what it reports.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VoiceClient: Send {
    async fn start(
        &mut self,
        assistant: &AssistantOptions,
        overrides: &AssistantOverrides,
    ) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;
}

/// Where engine events come from.
pub trait EventSource {
    /// Subscribe to the given kinds of engine events.
    fn subscribe(&self, kinds: &[EventKind]) -> Result<Subscription>;
}

/// A typed subscription to a subset of engine events.
/// Dropping it (or calling `unsubscribe`) detaches from the engine.
pub struct Subscription {
    rx: broadcast::Receiver<EngineEvent>,
    kinds: BTreeSet<EventKind>,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<EngineEvent>, kinds: &[EventKind]) -> Self {
        Self {
            rx,
            kinds: kinds.iter().copied().collect(),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Next event of a subscribed kind, or `None` once the engine is gone.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.kinds.contains(&event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Engine subscription lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!("Unsubscribing from {:?}", self.kinds);
    }

    /// Forward subscribed events into a session's input queue. The task ends
    /// when the engine closes or the session stops reading its queue.
    pub fn forward(mut self, inputs: mpsc::Sender<Input>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.recv().await {
                if inputs.send(Input::Engine(event)).await.is_err() {
                    tracing::debug!("Session queue closed, stopping event forwarding.");
                    break;
                }
            }
            self.unsubscribe();
        })
    }
}
