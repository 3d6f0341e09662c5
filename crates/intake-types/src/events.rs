pub mod message;

use crate::assistant::{AssistantOptions, AssistantOverrides};
use message::Message;

/// Events emitted by the voice engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    #[serde(rename = "speech-start")]
    SpeechStart,
    #[serde(rename = "speech-end")]
    SpeechEnd,
    #[serde(rename = "call-start")]
    CallStart,
    #[serde(rename = "call-end")]
    CallEnd,
    #[serde(rename = "message")]
    Message { message: Message },
    /// Emitted locally when the transport closes.
    #[serde(rename = "close")]
    Close { reason: Option<String> },
}

impl EngineEvent {
    pub fn message(message: Message) -> Self {
        EngineEvent::Message { message }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::SpeechStart => EventKind::SpeechStart,
            EngineEvent::SpeechEnd => EventKind::SpeechEnd,
            EngineEvent::CallStart => EventKind::CallStart,
            EngineEvent::CallEnd => EventKind::CallEnd,
            EngineEvent::Message { .. } => EventKind::Message,
            EngineEvent::Close { .. } => EventKind::Close,
        }
    }
}

/// The discriminant of an `EngineEvent`, used to subscribe to a subset of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SpeechStart,
    SpeechEnd,
    CallStart,
    CallEnd,
    Message,
    Close,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::SpeechStart,
        EventKind::SpeechEnd,
        EventKind::CallStart,
        EventKind::CallEnd,
        EventKind::Message,
        EventKind::Close,
    ];
}

/// Commands sent to the voice engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "start")]
    Start {
        assistant: AssistantOptions,
        #[serde(
            rename = "assistantOverrides",
            default,
            skip_serializing_if = "AssistantOverrides::is_empty"
        )]
        assistant_overrides: AssistantOverrides,
    },
    #[serde(rename = "stop")]
    Stop,
}

impl ClientCommand {
    pub fn start(assistant: AssistantOptions, overrides: AssistantOverrides) -> Self {
        ClientCommand::Start {
            assistant,
            assistant_overrides: overrides,
        }
    }
}
