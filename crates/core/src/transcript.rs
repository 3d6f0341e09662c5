use intake_types::events::message::{ConversationUpdateMessage, TranscriptMessage};
use intake_types::{EngineEvent, Message, Role};
use std::collections::HashSet;

/// What a single observed event did to the histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    UserResponse,
    AssistantPrompt,
    /// The snapshot's latest assistant line was already recorded.
    DuplicatePrompt,
    /// Display state changed, histories did not.
    DisplayOnly,
    Ignored,
}

/// Builds the two append-only histories of a call from engine messages.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    user_responses: Vec<String>,
    assistant_prompts: Vec<String>,
    seen_prompts: HashSet<String>,
    message_count: usize,
    last_message: String,
    current_utterance: Option<String>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &EngineEvent) -> Observation {
        let EngineEvent::Message { message } = event else {
            return Observation::Ignored;
        };
        self.message_count += 1;

        match message {
            Message::Transcript(transcript) => self.observe_transcript(transcript),
            Message::ConversationUpdate(update) => self.observe_conversation(update),
            Message::FunctionCall(call) => {
                let name = call
                    .function_call()
                    .map(|c| c.name())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Processing...");
                self.last_message = format!("Assistant: {}", name);
                Observation::DisplayOnly
            }
            Message::Other => Observation::Ignored,
        }
    }

    /// Only user transcripts count. The web client this replaces took every
    /// final transcript regardless of role; here assistant speech is taken
    /// from conversation snapshots only, so it never lands in the user history.
    fn observe_transcript(&mut self, transcript: &TranscriptMessage) -> Observation {
        if transcript.role() != Role::User {
            return Observation::Ignored;
        }
        if !transcript.is_final() {
            self.current_utterance = Some(transcript.text().to_string());
            return Observation::DisplayOnly;
        }

        let text = transcript.text().to_string();
        self.last_message = format!("You: {}", text);
        self.current_utterance = None;
        self.user_responses.push(text);
        Observation::UserResponse
    }

    fn observe_conversation(&mut self, update: &ConversationUpdateMessage) -> Observation {
        let Some(content) = update
            .last_assistant_turn()
            .and_then(|turn| turn.content())
            .filter(|c| !c.is_empty())
        else {
            return Observation::Ignored;
        };

        self.last_message = format!("Assistant: {}", content);
        if !self.seen_prompts.insert(content.to_string()) {
            return Observation::DuplicatePrompt;
        }
        self.assistant_prompts.push(content.to_string());
        Observation::AssistantPrompt
    }

    pub fn user_responses(&self) -> &[String] {
        &self.user_responses
    }

    pub fn assistant_prompts(&self) -> &[String] {
        &self.assistant_prompts
    }

    pub fn is_empty(&self) -> bool {
        self.user_responses.is_empty() && self.assistant_prompts.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    pub fn current_utterance(&self) -> Option<&str> {
        self.current_utterance.as_deref()
    }

    /// Drop transient display state; the histories are kept.
    pub fn clear_display(&mut self) {
        self.last_message.clear();
        self.current_utterance = None;
    }
}
