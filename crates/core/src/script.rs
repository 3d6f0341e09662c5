use intake_types::AssistantOptions;
use std::collections::HashMap;

pub const ASSISTANT_NAME: &str = "AI interview assistant";
pub const FIRST_MESSAGE: &str = "Hey {{username}}! Let's prepare your interview. I'll ask you a few questions and generate a perfect interview just for you. Are you ready?";
pub const CLOSING_LINE: &str =
    "Perfect! Your interview has been generated. Thank you, and good luck 🚀";

/// Prompt keys that may override the built-in script.
pub const SYSTEM_PROMPT_KEY: &str = "system";
pub const FIRST_MESSAGE_KEY: &str = "first_message";

/// The five details the assistant has to collect, in the order it asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeField {
    Role,
    InterviewType,
    ExperienceLevel,
    TechStack,
    QuestionCount,
}

impl IntakeField {
    pub const ALL: [IntakeField; 5] = [
        IntakeField::Role,
        IntakeField::InterviewType,
        IntakeField::ExperienceLevel,
        IntakeField::TechStack,
        IntakeField::QuestionCount,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            IntakeField::Role => "Role/Position (string)",
            IntakeField::InterviewType => "Interview Type (technical, behavioral, or mixed)",
            IntakeField::ExperienceLevel => "Experience Level (beginner, intermediate, hard)",
            IntakeField::TechStack => "Tech Stack (string[] – list of technologies)",
            IntakeField::QuestionCount => "Question Count (number)",
        }
    }

    /// The exact wording the assistant must use.
    pub fn question(&self) -> &'static str {
        match self {
            IntakeField::Role => "What role would you like to train for?",
            IntakeField::InterviewType => {
                "Are you aiming for the technical, behavioral or mixed interview?"
            }
            IntakeField::ExperienceLevel => {
                "What is your experience level (beginner, intermediate, or hard)?"
            }
            IntakeField::TechStack => "A list of technologies to cover during the job interview?",
            IntakeField::QuestionCount => "How many questions would you like me to prepare for you?",
        }
    }
}

/// The fixed conversation the assistant drives, rendered into the engine's
/// assistant configuration.
#[derive(Debug, Clone)]
pub struct IntakeScript {
    system_prompt: String,
    first_message: String,
}

impl Default for IntakeScript {
    fn default() -> Self {
        Self {
            system_prompt: render_system_prompt(),
            first_message: FIRST_MESSAGE.to_string(),
        }
    }
}

impl IntakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `system` / `first_message` overrides loaded from prompt files.
    pub fn with_prompts(mut self, prompts: &HashMap<String, String>) -> Self {
        if let Some(system) = prompts.get(SYSTEM_PROMPT_KEY) {
            tracing::info!("Using system prompt override.");
            self.system_prompt = system.trim().to_string();
        }
        if let Some(first) = prompts.get(FIRST_MESSAGE_KEY) {
            tracing::info!("Using first message override.");
            self.first_message = first.trim().to_string();
        }
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn first_message(&self) -> &str {
        &self.first_message
    }

    pub fn assistant_options(&self) -> AssistantOptions {
        AssistantOptions::new(ASSISTANT_NAME)
            .with_first_message(&self.first_message)
            .with_transcriber("deepgram", "nova-2", "en-US")
            .with_voice("playht", "jennifer")
            .with_model("openai", "gpt-4")
            .with_system_prompt(&self.system_prompt)
    }
}

fn render_system_prompt() -> String {
    let details = IntakeField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{}. {}", i + 1, field.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let flow = IntakeField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{}. \"{}\"", i + 1, field.question()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an AI interview assistant.
Your task is to collect these **{count} required details** from the user:

{details}

---

### Exact Question Flow:
{flow}

---

### Rules:
- **You must always speak first** when the conversation starts and before every new question.
- Ask **one question at a time** in the exact wording above.
- Wait for the user's response before moving on.
- If unclear or incomplete, **politely ask again** until the answer is valid.
- If the user does not start speaking within 1 second, the system should automatically repeat/speak the question for them.
- After collecting all {count} answers, say:
  "{closing}"
- Stop after that.

Keep responses **short, friendly, and conversational**."#,
        count = IntakeField::ALL.len(),
        closing = CLOSING_LINE,
    )
}
