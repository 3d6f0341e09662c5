use crate::dispatcher::{DispatchError, Dispatcher, GenerationRequest, GenerationResponse};
use crate::session_state::{ConnectionPhase, SessionState, SpeakingPhase};
use crate::transcript::{Observation, TranscriptAggregator};
use crate::voice_client::VoiceClient;
use crate::{Command, Input};
use intake_types::{AssistantOptions, AssistantOverrides, EngineEvent};
use tokio::sync::{mpsc, watch};

pub const SUCCESS_NOTIFICATION: &str = "Interview created successfully!";
pub const LANDING_VIEW: &str = "/";

/// Which termination paths hand the collected data to the generation endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Only a local `stop()` dispatches. A call the engine ends on its own
    /// loses whatever was collected.
    #[default]
    ManualStopOnly,
    /// `stop()`, `call-end` and a dropped engine connection all dispatch.
    AnyTermination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LifecyclePhase {
    NotStarted,
    Connecting,
    Active,
    Terminating,
    Terminated,
}

/// What a termination did about the generation request.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent(GenerationResponse),
    Failed(DispatchError),
    /// Both histories were empty.
    SkippedEmpty,
    /// The one-shot guard had already fired for this session.
    AlreadyDispatched,
    /// The policy does not dispatch on this path.
    NotDispatched,
    /// `stop()` was a no-op: no voice capability, or nothing to stop.
    Ignored,
}

/// Read-only view of a session for whatever renders it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SessionSnapshot {
    pub lifecycle: LifecyclePhase,
    pub connection_phase: ConnectionPhase,
    pub speaking_phase: SpeakingPhase,
    pub is_active: bool,
    pub connecting_indicator: bool,
    pub avatar_animating: bool,
    pub last_message: String,
    pub current_utterance: Option<String>,
    pub transcript_visible: bool,
    pub user_responses: usize,
    pub assistant_prompts: usize,
}

/// Drives one call from `start()` to termination and fires the generation
/// request at most once.
pub struct CallController<V: VoiceClient, D: Dispatcher> {
    voice: Option<V>,
    dispatcher: D,
    assistant: AssistantOptions,
    overrides: AssistantOverrides,
    policy: DispatchPolicy,
    phase: LifecyclePhase,
    session: SessionState,
    transcript: TranscriptAggregator,
    dispatched: bool,
    command_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<V: VoiceClient, D: Dispatcher> CallController<V, D> {
    /// `voice` is `None` when the voice capability is not available; `start`
    /// and `stop` are then silent no-ops.
    pub fn new(
        voice: Option<V>,
        dispatcher: D,
        assistant: AssistantOptions,
        command_tx: mpsc::Sender<Command>,
    ) -> Self {
        let session = SessionState::new();
        let transcript = TranscriptAggregator::new();
        let (snapshot_tx, _) = watch::channel(build_snapshot(
            LifecyclePhase::NotStarted,
            &session,
            &transcript,
        ));
        Self {
            voice,
            dispatcher,
            assistant,
            overrides: AssistantOverrides::default(),
            policy: DispatchPolicy::default(),
            phase: LifecyclePhase::NotStarted,
            session,
            transcript,
            dispatched: false,
            command_tx,
            snapshot_tx,
        }
    }

    pub fn with_overrides(mut self, overrides: AssistantOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn user_responses(&self) -> &[String] {
        self.transcript.user_responses()
    }

    pub fn assistant_prompts(&self) -> &[String] {
        self.transcript.assistant_prompts()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == LifecyclePhase::Terminated
    }

    pub async fn start(&mut self) {
        if self.phase != LifecyclePhase::NotStarted {
            tracing::debug!("start() ignored in phase {:?}", self.phase);
            return;
        }
        if self.voice.is_none() {
            tracing::debug!("Voice capability unavailable, start() ignored.");
            return;
        }

        self.session.begin_connecting();
        self.phase = LifecyclePhase::Connecting;
        self.publish();

        tracing::info!("Starting call with assistant '{}'", self.assistant.name());
        let Some(voice) = self.voice.as_mut() else {
            return;
        };
        if let Err(e) = voice.start(&self.assistant, &self.overrides).await {
            tracing::error!("Failed to start voice session: {:?}", e);
            self.session = SessionState::new();
            self.phase = LifecyclePhase::NotStarted;
            self.publish();
        }
    }

    /// Manual termination. Dispatches the collected histories if there are any.
    pub async fn stop(&mut self) -> DispatchOutcome {
        let Some(voice) = self.voice.as_mut() else {
            tracing::debug!("Voice capability unavailable, stop() ignored.");
            return DispatchOutcome::Ignored;
        };
        if matches!(
            self.phase,
            LifecyclePhase::NotStarted | LifecyclePhase::Terminating | LifecyclePhase::Terminated
        ) {
            tracing::debug!("stop() ignored in phase {:?}", self.phase);
            return DispatchOutcome::Ignored;
        }

        if let Err(e) = voice.stop().await {
            tracing::warn!("Failed to stop voice session: {:?}", e);
        }
        self.session.end();
        self.phase = LifecyclePhase::Terminating;
        self.publish();

        tracing::info!("Call ended manually.");
        tracing::info!("User responses: {:?}", self.transcript.user_responses());
        tracing::info!("Assistant prompts: {:?}", self.transcript.assistant_prompts());
        tracing::debug!("Messages seen: {}", self.transcript.message_count());

        let outcome = self.dispatch().await;
        self.phase = LifecyclePhase::Terminated;
        self.publish();
        outcome
    }

    pub async fn handle_event(&mut self, event: EngineEvent) {
        self.session = self.session.apply(&event);

        match &event {
            EngineEvent::CallStart => {
                if matches!(
                    self.phase,
                    LifecyclePhase::NotStarted | LifecyclePhase::Connecting
                ) {
                    tracing::info!("Call started.");
                    self.phase = LifecyclePhase::Active;
                }
            }
            EngineEvent::CallEnd => {
                self.transcript.clear_display();
                self.emit(Command::ClearTranscript).await;
                self.emit(Command::ShowNotification(SUCCESS_NOTIFICATION.to_string()))
                    .await;
                self.emit(Command::NavigateTo(LANDING_VIEW.to_string()))
                    .await;
                self.terminate_from_engine("call-end").await;
            }
            EngineEvent::Close { reason } => {
                tracing::warn!("Engine connection closed: {:?}", reason);
                self.session.end();
                self.terminate_from_engine("connection close").await;
            }
            EngineEvent::Message { .. } => match self.transcript.observe(&event) {
                Observation::UserResponse => {
                    tracing::info!("User said: \"{}\"", self.transcript.last_message());
                }
                Observation::AssistantPrompt => {
                    tracing::info!("Assistant said: \"{}\"", self.transcript.last_message());
                }
                other => tracing::debug!("Message observed: {:?}", other),
            },
            EngineEvent::SpeechStart | EngineEvent::SpeechEnd => {
                tracing::debug!("Speaking phase: {:?}", self.session.speaking_phase);
            }
        }

        self.publish();
    }

    /// Process inputs from the session queue until the call is over, then
    /// accept whatever was queued while the last step was in flight.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<Input>) -> Self {
        while let Some(input) = inputs.recv().await {
            self.handle_input(input).await;
            if self.is_finished() {
                break;
            }
        }
        while let Ok(input) = inputs.try_recv() {
            self.handle_input(input).await;
        }
        self
    }

    async fn handle_input(&mut self, input: Input) {
        match input {
            Input::Start => self.start().await,
            Input::Stop => {
                let outcome = self.stop().await;
                tracing::debug!("stop() outcome: {:?}", outcome);
            }
            Input::Engine(event) => self.handle_event(event).await,
        }
    }

    async fn terminate_from_engine(&mut self, cause: &str) {
        if matches!(
            self.phase,
            LifecyclePhase::Terminating | LifecyclePhase::Terminated
        ) {
            return;
        }
        tracing::info!("Call terminated by engine ({}).", cause);
        self.phase = LifecyclePhase::Terminating;
        self.publish();

        let outcome = match self.policy {
            DispatchPolicy::AnyTermination => self.dispatch().await,
            DispatchPolicy::ManualStopOnly => {
                if !self.transcript.is_empty() {
                    tracing::warn!(
                        "Call ended without stop(); {} responses and {} prompts are not dispatched.",
                        self.transcript.user_responses().len(),
                        self.transcript.assistant_prompts().len()
                    );
                }
                DispatchOutcome::NotDispatched
            }
        };
        tracing::debug!("{} dispatch outcome: {:?}", cause, outcome);
        self.phase = LifecyclePhase::Terminated;
    }

    async fn dispatch(&mut self) -> DispatchOutcome {
        if self.dispatched {
            return DispatchOutcome::AlreadyDispatched;
        }
        if self.transcript.is_empty() {
            tracing::info!("No data to send to the generation endpoint.");
            return DispatchOutcome::SkippedEmpty;
        }

        self.dispatched = true;
        let request = GenerationRequest::new(
            self.transcript.user_responses().to_vec(),
            self.transcript.assistant_prompts().to_vec(),
        );
        match self.dispatcher.send(request).await {
            Ok(response) => {
                tracing::info!("Generation request succeeded: {}", response.body());
                DispatchOutcome::Sent(response)
            }
            Err(e) => {
                tracing::error!("Generation request failed: {}", e);
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn emit(&self, command: Command) {
        if let Err(e) = self.command_tx.send(command).await {
            tracing::warn!("Failed to send UI command: {:?}", e);
        }
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(build_snapshot(self.phase, &self.session, &self.transcript));
    }
}

fn build_snapshot(
    lifecycle: LifecyclePhase,
    session: &SessionState,
    transcript: &TranscriptAggregator,
) -> SessionSnapshot {
    SessionSnapshot {
        lifecycle,
        connection_phase: session.connection_phase,
        speaking_phase: session.speaking_phase,
        is_active: session.is_active,
        connecting_indicator: session.connecting_indicator,
        avatar_animating: session.avatar_animating(),
        last_message: transcript.last_message().to_string(),
        current_utterance: transcript.current_utterance().map(str::to_string),
        transcript_visible: transcript.message_count() > 0 && session.is_active,
        user_responses: transcript.user_responses().len(),
        assistant_prompts: transcript.assistant_prompts().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::MockDispatcher;
    use crate::voice_client::MockVoiceClient;
    use intake_types::{ConversationTurn, Message, Role};

    type Controller = CallController<MockVoiceClient, MockDispatcher>;

    fn voice() -> MockVoiceClient {
        let mut voice = MockVoiceClient::new();
        voice.expect_start().returning(|_, _| Ok(()));
        voice.expect_stop().returning(|| Ok(()));
        voice
    }

    fn controller(
        voice: Option<MockVoiceClient>,
        dispatcher: MockDispatcher,
    ) -> (Controller, mpsc::Receiver<Command>) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let controller = CallController::new(
            voice,
            dispatcher,
            AssistantOptions::new("AI interview assistant"),
            command_tx,
        );
        (controller, command_rx)
    }

    fn final_transcript(text: &str) -> EngineEvent {
        EngineEvent::message(Message::final_transcript(text))
    }

    fn assistant_says(conversation: &[&str]) -> EngineEvent {
        let mut turns = vec![ConversationTurn::new(Role::System, "script")];
        for line in conversation {
            turns.push(ConversationTurn::new(Role::Assistant, line));
            turns.push(ConversationTurn::new(Role::User, "..."));
        }
        EngineEvent::message(Message::conversation_update(turns))
    }

    fn ok_response() -> Result<GenerationResponse, DispatchError> {
        Ok(GenerationResponse::new(serde_json::json!({ "success": true })))
    }

    #[tokio::test]
    async fn test_scenario_stop_dispatches_accumulated_histories_once() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|request| {
                request.user_responses == ["React", "Node"]
                    && request.assistant_prompts == ["What stack?"]
            })
            .times(1)
            .returning(|_| ok_response());
        let (mut controller, _commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        controller.handle_event(EngineEvent::CallStart).await;
        controller.handle_event(final_transcript("React")).await;
        controller.handle_event(assistant_says(&["What stack?"])).await;
        controller.handle_event(final_transcript("Node")).await;

        let outcome = controller.stop().await;
        assert!(matches!(outcome, DispatchOutcome::Sent(_)));
        assert_eq!(controller.user_responses(), ["React", "Node"]);
        assert_eq!(controller.assistant_prompts(), ["What stack?"]);
        assert_eq!(controller.phase(), LifecyclePhase::Terminated);

        // A second stop must not dispatch again.
        assert!(matches!(controller.stop().await, DispatchOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_start_then_immediate_stop_never_dispatches() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send().never();
        let (mut controller, _commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        assert_eq!(controller.phase(), LifecyclePhase::Connecting);
        assert!(matches!(
            controller.stop().await,
            DispatchOutcome::SkippedEmpty
        ));
        assert!(controller.is_finished());
    }

    #[tokio::test]
    async fn test_start_passes_assistant_and_overrides_to_engine() {
        let mut voice = MockVoiceClient::new();
        voice
            .expect_start()
            .withf(|assistant, overrides| {
                assistant.name() == "AI interview assistant"
                    && overrides.variable("username") == Some("Nikhil")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let (controller, _commands) = controller(Some(voice), MockDispatcher::new());
        let mut controller = controller
            .with_overrides(AssistantOverrides::new().with_variable("username", "Nikhil"));

        controller.start().await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.lifecycle, LifecyclePhase::Connecting);
        assert!(snapshot.connecting_indicator);
    }

    #[tokio::test]
    async fn test_failed_engine_start_returns_to_not_started() {
        let mut voice = MockVoiceClient::new();
        voice
            .expect_start()
            .returning(|_, _| Err(anyhow::anyhow!("engine unavailable")));
        let (mut controller, _commands) = controller(Some(voice), MockDispatcher::new());

        controller.start().await;
        assert_eq!(controller.phase(), LifecyclePhase::NotStarted);
        assert_eq!(controller.session().connection_phase, ConnectionPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_voice_capability_is_a_silent_no_op() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send().never();
        let (mut controller, _commands) = controller(None, dispatcher);

        controller.start().await;
        assert_eq!(controller.phase(), LifecyclePhase::NotStarted);

        controller.handle_event(final_transcript("React")).await;
        assert!(matches!(controller.stop().await, DispatchOutcome::Ignored));
    }

    // Known gap: an engine-ended call drops its data under the default policy.
    #[tokio::test]
    async fn test_call_end_does_not_dispatch_by_default() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send().never();
        let (mut controller, mut commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        controller.handle_event(EngineEvent::CallStart).await;
        controller.handle_event(final_transcript("React")).await;
        controller.handle_event(EngineEvent::CallEnd).await;

        assert!(controller.is_finished());
        assert!(!controller.session().is_active);
        assert_eq!(commands.recv().await, Some(Command::ClearTranscript));
        assert_eq!(
            commands.recv().await,
            Some(Command::ShowNotification(SUCCESS_NOTIFICATION.to_string()))
        );
        assert_eq!(
            commands.recv().await,
            Some(Command::NavigateTo(LANDING_VIEW.to_string()))
        );
        assert_eq!(controller.snapshot().last_message, "");

        // Once the engine has ended the call there is nothing left to stop.
        assert!(matches!(controller.stop().await, DispatchOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_any_termination_policy_dispatches_on_call_end_once() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_| ok_response());
        let (controller, _commands) = controller(Some(voice()), dispatcher);
        let mut controller = controller.with_policy(DispatchPolicy::AnyTermination);

        controller.start().await;
        controller.handle_event(EngineEvent::CallStart).await;
        controller.handle_event(assistant_says(&["Ready?"])).await;
        controller.handle_event(EngineEvent::CallEnd).await;
        controller.handle_event(EngineEvent::CallEnd).await;
        controller
            .handle_event(EngineEvent::Close { reason: None })
            .await;

        assert!(controller.is_finished());
        assert!(matches!(controller.stop().await, DispatchOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_stop_then_late_call_end_does_not_dispatch_twice() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_| ok_response());
        let (controller, mut commands) = controller(Some(voice()), dispatcher);
        let mut controller = controller.with_policy(DispatchPolicy::AnyTermination);

        controller.start().await;
        controller.handle_event(final_transcript("React")).await;
        assert!(matches!(controller.stop().await, DispatchOutcome::Sent(_)));

        controller.handle_event(EngineEvent::CallEnd).await;
        // The success notification is still shown for the engine's call-end.
        assert_eq!(commands.recv().await, Some(Command::ClearTranscript));
    }

    #[tokio::test]
    async fn test_failed_dispatch_is_reported_not_retried() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_| Err(DispatchError::Status(502)));
        let (mut controller, _commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        controller.handle_event(final_transcript("React")).await;
        let outcome = controller.stop().await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Failed(DispatchError::Status(502))
        ));
        assert!(controller.is_finished());
    }

    #[tokio::test]
    async fn test_late_messages_after_stop_keep_histories_monotonic() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|request| request.user_responses == ["React"])
            .times(1)
            .returning(|_| ok_response());
        let (mut controller, _commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        controller.handle_event(final_transcript("React")).await;
        controller.stop().await;
        controller.handle_event(final_transcript("Node")).await;

        assert_eq!(controller.user_responses(), ["React", "Node"]);
    }

    #[tokio::test]
    async fn test_snapshot_tracks_display_state() {
        let (mut controller, _commands) = controller(Some(voice()), MockDispatcher::new());
        let mut snapshots = controller.subscribe_snapshots();

        controller.start().await;
        controller.handle_event(EngineEvent::CallStart).await;
        controller.handle_event(EngineEvent::SpeechStart).await;
        controller
            .handle_event(EngineEvent::message(Message::partial_transcript("Rea")))
            .await;

        assert!(snapshots.has_changed().unwrap());
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.lifecycle, LifecyclePhase::Active);
        assert_eq!(snapshot.connection_phase, ConnectionPhase::Connected);
        assert!(!snapshot.connecting_indicator);
        assert!(snapshot.avatar_animating);
        assert!(snapshot.transcript_visible);
        assert_eq!(snapshot.current_utterance.as_deref(), Some("Rea"));
        assert_eq!(snapshot.user_responses, 0);

        controller.handle_event(final_transcript("React")).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.last_message, "You: React");
        assert_eq!(snapshot.user_responses, 1);
    }

    #[tokio::test]
    async fn test_connection_close_ends_session_without_dispatch_by_default() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send().never();
        let (mut controller, mut commands) = controller(Some(voice()), dispatcher);

        controller.start().await;
        controller.handle_event(EngineEvent::CallStart).await;
        controller.handle_event(final_transcript("React")).await;
        controller
            .handle_event(EngineEvent::Close {
                reason: Some("connection reset".to_string()),
            })
            .await;

        assert!(controller.is_finished());
        assert!(!controller.session().is_active);
        assert_eq!(controller.session().connection_phase, ConnectionPhase::Ended);
        // No success notification for an abnormal end.
        assert!(commands.try_recv().is_err());
        assert!(matches!(controller.stop().await, DispatchOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_connection_close_dispatches_under_any_termination() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|request| request.user_responses == ["React"])
            .times(1)
            .returning(|_| ok_response());
        let (controller, mut commands) = controller(Some(voice()), dispatcher);
        let mut controller = controller.with_policy(DispatchPolicy::AnyTermination);

        controller.start().await;
        controller.handle_event(final_transcript("React")).await;
        controller
            .handle_event(EngineEvent::Close { reason: None })
            .await;

        assert!(controller.is_finished());
        assert!(commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_processes_queue_until_terminated() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|request| {
                request.user_responses == ["React"] && request.assistant_prompts == ["Ready?"]
            })
            .times(1)
            .returning(|_| ok_response());
        let (controller, _commands) = controller(Some(voice()), dispatcher);

        let (input_tx, input_rx) = mpsc::channel(16);
        for input in [
            Input::Start,
            Input::Engine(EngineEvent::CallStart),
            Input::Engine(assistant_says(&["Ready?"])),
            Input::Engine(assistant_says(&["Ready?"])),
            Input::Engine(EngineEvent::message(Message::partial_transcript("Rea"))),
            Input::Engine(final_transcript("React")),
            Input::Stop,
            Input::Engine(EngineEvent::CallEnd),
        ] {
            input_tx.send(input).await.unwrap();
        }

        let controller = controller.run(input_rx).await;
        assert!(controller.is_finished());
        assert_eq!(controller.assistant_prompts(), ["Ready?"]);
        // The queued call-end was drained after stop() finished.
        assert_eq!(controller.session().connection_phase, ConnectionPhase::Ended);
        drop(input_tx);
    }
}
