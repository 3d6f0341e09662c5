use anyhow::{Context, Result};
use async_trait::async_trait;
use intake_core::voice_client::{EventSource, Subscription, VoiceClient};
use intake_realtime::EngineClient;
use intake_realtime::types::{AssistantOptions, AssistantOverrides, EventKind};

/// Implements the core `VoiceClient` and `EventSource` traits for an engine
/// connection. Generic over `EngineClient` so the connection can be mocked.
pub struct VoiceAdapter<C: EngineClient> {
    client: C,
}

impl VoiceAdapter<intake_realtime::Client> {
    pub async fn connect(config: intake_realtime::Config, capacity: usize) -> Result<Self> {
        let client = intake_realtime::connect_with_config(capacity, config)
            .await
            .context("Failed to connect to the voice engine")?;
        Ok(Self { client })
    }
}

impl<C: EngineClient> VoiceAdapter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: EngineClient> VoiceClient for VoiceAdapter<C> {
    async fn start(
        &mut self,
        assistant: &AssistantOptions,
        overrides: &AssistantOverrides,
    ) -> Result<()> {
        self.client
            .start(assistant.clone(), overrides.clone())
            .await
            .context("Adapter failed to send start command")
    }

    async fn stop(&mut self) -> Result<()> {
        self.client
            .stop()
            .await
            .context("Adapter failed to send stop command")
    }
}

impl<C: EngineClient> EventSource for VoiceAdapter<C> {
    fn subscribe(&self, kinds: &[EventKind]) -> Result<Subscription> {
        let rx = self
            .client
            .server_events()
            .context("Failed to subscribe to engine events")?;
        Ok(Subscription::new(rx, kinds))
    }
}
