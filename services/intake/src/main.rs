use anyhow::{Context, Result};
use clap::Parser;
use intake_core::controller::{CallController, DispatchPolicy};
use intake_core::dispatcher::GenerationClient;
use intake_core::identity::{StaticIdentity, UserIdentity, greeting_overrides};
use intake_core::script::IntakeScript;
use intake_core::types::EventKind;
use intake_core::voice_client::EventSource;
use intake_core::{Command, Input};
use intake_service::config::{
    COMMAND_CHANNEL_CAPACITY, Config, ENGINE_CHANNEL_CAPACITY, INPUT_QUEUE_CAPACITY,
};
use intake_service::prompt_loader;
use intake_service::realtime_adapter::VoiceAdapter;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Collects interview preferences over a voice call")]
struct Cli {
    /// Name used in the assistant's greeting (overrides INTAKE_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Also send the collected answers when the engine ends the call itself
    #[arg(long)]
    dispatch_on_call_end: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting intake service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let username = args.username.or_else(|| config.username.clone());
    let policy = if args.dispatch_on_call_end || config.dispatch_on_call_end {
        DispatchPolicy::AnyTermination
    } else {
        DispatchPolicy::ManualStopOnly
    };
    tracing::info!("Dispatch policy: {:?}", policy);

    // --- 4. Load Prompts ---
    let prompts = match &config.prompts_dir {
        Some(dir) => {
            prompt_loader::load_prompts(dir).context("Failed to load prompt overrides")?
        }
        None => HashMap::new(),
    };
    tracing::info!("Loaded {} prompt overrides.", prompts.len());
    let script = IntakeScript::new().with_prompts(&prompts);

    let identity = StaticIdentity::new(username.as_deref().map(UserIdentity::new));
    let overrides = greeting_overrides(&identity);

    // --- 5. Connect to the Voice Engine ---
    let engine_config = intake_realtime::Config::builder()
        .with_base_url(&config.engine_url)
        .with_public_key(config.public_key.expose_secret())
        .build();
    let voice = VoiceAdapter::connect(engine_config, ENGINE_CHANNEL_CAPACITY).await?;
    tracing::info!("Connected to voice engine at {}", config.engine_url);

    // --- 6. Session Setup ---
    let (input_tx, input_rx) = mpsc::channel::<Input>(INPUT_QUEUE_CAPACITY);
    // Create the command channel to decouple core logic from the runtime.
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(COMMAND_CHANNEL_CAPACITY);

    let forwarder = voice
        .subscribe(&EventKind::ALL)
        .context("Failed to subscribe to engine events")?
        .forward(input_tx.clone());

    let dispatcher = GenerationClient::new(config.generate_endpoint.clone());
    let controller = CallController::new(
        Some(voice),
        dispatcher,
        script.assistant_options(),
        command_tx,
    )
    .with_overrides(overrides)
    .with_policy(policy);

    // This task logs every snapshot change; a UI would render them instead.
    let mut snapshots = controller.subscribe_snapshots();
    let snapshot_logger = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            match serde_json::to_string(&snapshot) {
                Ok(json) => tracing::debug!("Session snapshot: {}", json),
                Err(e) => tracing::warn!("Failed to serialize snapshot: {:?}", e),
            }
        }
    });

    // This task handles commands from the core logic, executing side effects.
    let command_handler = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                Command::ClearTranscript => {
                    tracing::info!("COMMAND RECEIVED: Clear transcript");
                }
                Command::ShowNotification(text) => {
                    tracing::info!("COMMAND RECEIVED: Show notification: '{}'", text);
                }
                Command::NavigateTo(route) => {
                    tracing::info!("COMMAND RECEIVED: Navigate to '{}'", route);
                }
            }
        }
    });

    input_tx
        .send(Input::Start)
        .await
        .context("Failed to enqueue start")?;
    let mut session = tokio::spawn(controller.run(input_rx));

    let controller = tokio::select! {
        result = &mut session => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, stopping the call...");
            if let Err(e) = input_tx.send(Input::Stop).await {
                tracing::warn!("Failed to enqueue stop: {:?}", e);
            }
            session.await
        }
    }
    .context("Session task failed")?;

    tracing::info!(
        "Session finished with {} responses and {} prompts.",
        controller.user_responses().len(),
        controller.assistant_prompts().len()
    );

    forwarder.abort();
    drop(controller);
    if let Err(e) = command_handler.await {
        tracing::warn!("Command handler ended abnormally: {:?}", e);
    }
    snapshot_logger.abort();

    tracing::info!("Shutting down...");
    Ok(())
}
