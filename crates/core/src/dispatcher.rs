use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

/// The body posted to the generation endpoint once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub user_responses: Vec<String>,
    pub assistant_prompts: Vec<String>,
    /// ISO-8601, UTC, millisecond precision.
    pub timestamp: String,
}

impl GenerationRequest {
    pub fn new(user_responses: Vec<String>, assistant_prompts: Vec<String>) -> Self {
        Self::at(user_responses, assistant_prompts, Utc::now())
    }

    pub fn at(
        user_responses: Vec<String>,
        assistant_prompts: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_responses,
            assistant_prompts,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Whatever JSON the endpoint answered with. Only logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationResponse(serde_json::Value);

impl GenerationResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("generation endpoint returned HTTP {0}")]
    Status(u16),
    #[error("failed to reach generation endpoint: {0}")]
    Transport(String),
    #[error("failed to decode generation response: {0}")]
    Decode(String),
}

// The one outbound side effect of a session. The controller depends on this
// trait rather than on `GenerationClient` so tests can count invocations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, request: GenerationRequest) -> Result<GenerationResponse, DispatchError>;
}

pub struct GenerationClient {
    client: Client,
    endpoint: String,
}

impl GenerationClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Dispatcher for GenerationClient {
    async fn send(&self, request: GenerationRequest) -> Result<GenerationResponse, DispatchError> {
        tracing::info!("Calling generation endpoint {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| DispatchError::Decode(e.to_string()))
    }
}
