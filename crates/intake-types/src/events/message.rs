/// Payload of a `message` engine event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "transcript")]
    Transcript(TranscriptMessage),
    #[serde(rename = "conversation-update")]
    ConversationUpdate(ConversationUpdateMessage),
    #[serde(rename = "function-call")]
    FunctionCall(FunctionCallMessage),
    /// Any message type this crate does not model (status updates, hangs, ...).
    #[serde(other)]
    Other,
}

impl Message {
    pub fn final_transcript(text: &str) -> Self {
        Message::Transcript(TranscriptMessage::new(TranscriptType::Final, text))
    }

    pub fn partial_transcript(text: &str) -> Self {
        Message::Transcript(TranscriptMessage::new(TranscriptType::Partial, text))
    }

    pub fn conversation_update(conversation: Vec<ConversationTurn>) -> Self {
        Message::ConversationUpdate(ConversationUpdateMessage::new(conversation))
    }

    pub fn function_call(name: &str) -> Self {
        Message::FunctionCall(FunctionCallMessage::new(name))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
    // tool / function turns
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// `transcript` message
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptMessage {
    #[serde(rename = "transcriptType")]
    transcript_type: TranscriptType,

    /// The transcribed text
    transcript: String,

    /// Who was speaking, absent on some engine versions
    #[serde(default)]
    role: Role,
}

impl TranscriptMessage {
    pub fn new(transcript_type: TranscriptType, text: &str) -> Self {
        Self {
            transcript_type,
            transcript: text.to_string(),
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn transcript_type(&self) -> TranscriptType {
        self.transcript_type
    }

    pub fn text(&self) -> &str {
        &self.transcript
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_final(&self) -> bool {
        self.transcript_type == TranscriptType::Final
    }
}

/// One turn of a conversation snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationTurn {
    role: Role,
    #[serde(default)]
    content: Option<String>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: Some(content.to_string()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// `conversation-update` message, a full re-send of the conversation so far
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationUpdateMessage {
    #[serde(default)]
    conversation: Vec<ConversationTurn>,
}

impl ConversationUpdateMessage {
    pub fn new(conversation: Vec<ConversationTurn>) -> Self {
        Self { conversation }
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    /// The most recent assistant turn in the snapshot, if any.
    pub fn last_assistant_turn(&self) -> Option<&ConversationTurn> {
        self.conversation
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionCall {
    name: String,
    #[serde(default)]
    parameters: serde_json::Value,
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }
}

/// `function-call` message
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionCallMessage {
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

impl FunctionCallMessage {
    pub fn new(name: &str) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.to_string(),
                parameters: serde_json::Value::Null,
            }),
        }
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.function_call.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_assistant_turn_skips_trailing_user_turns() {
        let raw = r#"{
            "type": "conversation-update",
            "conversation": [
                { "role": "system", "content": "You are an AI interview assistant." },
                { "role": "assistant", "content": "What role would you like to train for?" },
                { "role": "user", "content": "Frontend developer" }
            ]
        }"#;

        let message: Message = serde_json::from_str(raw).unwrap();
        let Message::ConversationUpdate(update) = message else {
            panic!("Expected a conversation update");
        };
        let turn = update.last_assistant_turn().expect("assistant turn");
        assert_eq!(turn.content(), Some("What role would you like to train for?"));
    }

    #[test]
    fn test_tool_turns_without_content_parse() {
        let raw = r#"{
            "type": "conversation-update",
            "conversation": [
                { "role": "tool", "content": null },
                { "role": "assistant" }
            ]
        }"#;

        let message: Message = serde_json::from_str(raw).unwrap();
        let Message::ConversationUpdate(update) = message else {
            panic!("Expected a conversation update");
        };
        assert_eq!(update.conversation()[0].role(), Role::Other);
        assert_eq!(update.last_assistant_turn().and_then(|t| t.content()), None);
    }

    #[test]
    fn test_transcript_role_defaults_to_user() {
        let raw = r#"{"type":"transcript","transcriptType":"partial","transcript":"Rea"}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        let Message::Transcript(t) = message else {
            panic!("Expected a transcript");
        };
        assert_eq!(t.role(), Role::User);
        assert!(!t.is_final());
    }

    #[test]
    fn test_function_call_name() {
        let raw = r#"{"type":"function-call","functionCall":{"name":"generateInterview","parameters":{"role":"SRE"}}}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        let Message::FunctionCall(call) = message else {
            panic!("Expected a function call");
        };
        let call = call.function_call().expect("function call payload");
        assert_eq!(call.name(), "generateInterview");
        assert_eq!(call.parameters()["role"], "SRE");
    }
}
