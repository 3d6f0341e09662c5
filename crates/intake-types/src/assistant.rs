use crate::events::message::Role;
use std::collections::BTreeMap;

/// The assistant configuration handed to the voice engine on `start`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOptions {
    name: String,
    first_message: String,
    transcriber: Transcriber,
    voice: VoiceSettings,
    model: ModelSettings,
}

impl AssistantOptions {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            first_message: String::new(),
            transcriber: Transcriber::default(),
            voice: VoiceSettings::default(),
            model: ModelSettings::default(),
        }
    }

    pub fn with_first_message(mut self, first_message: &str) -> Self {
        self.first_message = first_message.to_string();
        self
    }

    pub fn with_transcriber(mut self, provider: &str, model: &str, language: &str) -> Self {
        self.transcriber = Transcriber {
            provider: provider.to_string(),
            model: model.to_string(),
            language: language.to_string(),
        };
        self
    }

    pub fn with_voice(mut self, provider: &str, voice_id: &str) -> Self {
        self.voice = VoiceSettings {
            provider: provider.to_string(),
            voice_id: voice_id.to_string(),
        };
        self
    }

    pub fn with_model(mut self, provider: &str, model: &str) -> Self {
        self.model.provider = provider.to_string();
        self.model.model = model.to_string();
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.model.messages = vec![ModelMessage {
            role: Role::System,
            content: prompt.to_string(),
        }];
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_message(&self) -> &str {
        &self.first_message
    }

    pub fn transcriber(&self) -> &Transcriber {
        &self.transcriber
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    pub fn model(&self) -> &ModelSettings {
        &self.model
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.model
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcriber {
    provider: String,
    model: String,
    language: String,
}

impl Transcriber {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
    provider: String,
    voice_id: String,
}

impl VoiceSettings {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelSettings {
    provider: String,
    model: String,
    messages: Vec<ModelMessage>,
}

impl ModelSettings {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelMessage {
    role: Role,
    content: String,
}

/// Per-call overrides, e.g. the values substituted into `{{username}}`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    #[serde(default)]
    variable_values: BTreeMap<String, String>,
}

impl AssistantOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, key: &str, value: &str) -> Self {
        self.variable_values
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variable_values.get(key).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.variable_values.is_empty()
    }
}
