//re-export types for easier access
pub mod assistant;
pub mod events;

pub use assistant::{AssistantOptions, AssistantOverrides};
pub use events::message::{ConversationTurn, Message, Role, TranscriptType};
pub use events::{ClientCommand, EngineEvent, EventKind};
