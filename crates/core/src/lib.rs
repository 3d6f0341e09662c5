pub mod controller;
pub mod dispatcher;
pub mod identity;
pub mod script;
pub mod session_state;
pub mod transcript;
pub mod voice_client;

pub use intake_types as types;

/// Represents UI-facing side effects the core logic (`CallController`) asks the runtime to perform.
///
/// The controller never renders anything itself; whichever frontend drives the
/// session consumes these from a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clear the transient "last message" line.
    ClearTranscript,
    /// Surface a success notification to the user.
    ShowNotification(String),
    /// Move the user to another view.
    NavigateTo(String),
}

/// Everything that can happen to a session, delivered through one serialized queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Start,
    Stop,
    Engine(types::EngineEvent),
}
