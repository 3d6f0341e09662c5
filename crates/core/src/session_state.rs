use intake_types::EngineEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum ConnectionPhase {
    #[default]
    Idle,
    Connecting,
    Connected,
    Ended,
}

/// Who currently holds the floor. Presentation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum SpeakingPhase {
    AssistantSpeaking,
    UserSpeaking,
    #[default]
    Idle,
}

/// Connection and speaking state of one call.
///
/// `apply` is a pure reducer over engine events. The engine's `speech-start`
/// clears the connecting indicator and moves the floor to `UserSpeaking`;
/// `speech-end` returns it to `Idle`. The avatar animation follows
/// `UserSpeaking`, which is how the web client this integrates with renders it.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SessionState {
    pub connection_phase: ConnectionPhase,
    pub speaking_phase: SpeakingPhase,
    pub is_active: bool,
    pub connecting_indicator: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, event: &EngineEvent) -> SessionState {
        let mut next = self.clone();

        // An ended session is reset; late events do not resurrect it.
        if self.connection_phase == ConnectionPhase::Ended {
            return next;
        }

        match event {
            EngineEvent::SpeechStart => {
                next.connecting_indicator = false;
                next.speaking_phase = SpeakingPhase::UserSpeaking;
            }
            EngineEvent::SpeechEnd => {
                next.speaking_phase = SpeakingPhase::Idle;
            }
            EngineEvent::CallStart => {
                next.connection_phase = ConnectionPhase::Connected;
                next.is_active = true;
            }
            EngineEvent::CallEnd => next.end(),
            EngineEvent::Message { .. } | EngineEvent::Close { .. } => {}
        }
        next
    }

    /// Local `start()`: the call has been requested but not yet confirmed.
    pub fn begin_connecting(&mut self) {
        self.connection_phase = ConnectionPhase::Connecting;
        self.connecting_indicator = true;
    }

    pub fn end(&mut self) {
        self.connection_phase = ConnectionPhase::Ended;
        self.speaking_phase = SpeakingPhase::Idle;
        self.is_active = false;
        self.connecting_indicator = false;
    }

    pub fn avatar_animating(&self) -> bool {
        self.speaking_phase == SpeakingPhase::UserSpeaking
    }
}
