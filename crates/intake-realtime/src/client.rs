use crate::types;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use intake_types::{AssistantOptions, AssistantOverrides};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;

pub mod config;
mod consts;
mod stats;
mod utils;

pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientCommand>;
type ServerTx = tokio::sync::broadcast::Sender<types::EngineEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::EngineEvent>;

/// The operations the rest of the system needs from an engine connection.
/// Implemented by `Client`; mocked in tests of the layers above it.
#[async_trait]
pub trait EngineClient: Send {
    async fn start(
        &mut self,
        assistant: AssistantOptions,
        overrides: AssistantOverrides,
    ) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    fn server_events(&self) -> Result<ServerRx>;
}

// Holds the channel capacity, the command/event transmitters, configuration,
// and stats guarded by a Mutex.
pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        // Writer: serialize queued commands onto the socket.
        tokio::spawn(async move {
            while let Some(command) = c_rx.recv().await {
                match serde_json::to_string(&command) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send command: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize command: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        // Reader: decode engine events and broadcast them to subscribers.
        tokio::spawn(async move {
            let mut closed = false;
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        broadcast_close(&s_tx, Some(e.to_string()));
                        closed = true;
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<types::EngineEvent>(&text) {
                            Ok(event) => {
                                tracing::debug!("received engine event: {:?}", event.kind());
                                if let Ok(mut stats_guard) = stats.lock() {
                                    stats_guard.record_event(&event);
                                } else {
                                    tracing::error!("failed to update stats");
                                }
                                if let Err(e) = s_tx.send(event) {
                                    tracing::warn!("no subscribers for engine event: {}", e);
                                }
                            }
                            Err(e) => {
                                if let Ok(mut stats_guard) = stats.lock() {
                                    stats_guard.record_decode_failure();
                                }
                                tracing::error!(
                                    "failed to deserialize event: {}, text=> {:?}",
                                    e,
                                    text
                                );
                            }
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        broadcast_close(&s_tx, reason.map(|v| format!("{:?}", v)));
                        closed = true;
                        break;
                    }
                    _ => {}
                }
            }
            if !closed {
                tracing::warn!("connection ended without a close frame");
                broadcast_close(&s_tx, Some("stream ended".to_string()));
            }
            drop(c_tx);
            drop(s_tx);
        });
        Ok(())
    }

    // Get a receiver for engine events. Events broadcast before this call are not replayed.
    pub fn server_events(&self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    async fn send_command(&mut self, command: types::ClientCommand) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(command).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    /// Ask the engine to start a call with the given assistant.
    pub async fn start(
        &mut self,
        assistant: AssistantOptions,
        overrides: AssistantOverrides,
    ) -> Result<()> {
        self.send_command(types::ClientCommand::start(assistant, overrides))
            .await
    }

    /// Ask the engine to hang up.
    pub async fn stop(&mut self) -> Result<()> {
        self.send_command(types::ClientCommand::Stop).await
    }
}

// Subscribers learn about a dead transport only through this event.
fn broadcast_close(s_tx: &ServerTx, reason: Option<String>) {
    if let Err(e) = s_tx.send(types::EngineEvent::Close { reason }) {
        tracing::error!("failed to send close event: {}", e);
    }
}

#[async_trait]
impl EngineClient for Client {
    async fn start(
        &mut self,
        assistant: AssistantOptions,
        overrides: AssistantOverrides,
    ) -> Result<()> {
        Client::start(self, assistant, overrides).await
    }

    async fn stop(&mut self) -> Result<()> {
        Client::stop(self).await
    }

    fn server_events(&self) -> Result<ServerRx> {
        Client::server_events(self)
    }
}

pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}
