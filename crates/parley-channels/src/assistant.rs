use crate::http::{client, ensure_success};
use async_trait::async_trait;
use parley_core::{ClientConfig, ConversationId, Credential, ParleyError, ParleyResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stateless request/reply exchange with the assistant service.
///
/// Implementations keep nothing between calls except what the caller passes
/// in; concurrent calls for one conversation are not serialized here.
#[async_trait]
pub trait AssistantTransport: Send + Sync {
    /// Send one user message and wait for the assistant's reply.
    async fn exchange(&self, conversation_id: &ConversationId, message: &str)
        -> ParleyResult<String>;

    /// Fetch the service-side transcript of a conversation. Unknown ids yield
    /// an empty transcript.
    async fn history(&self, conversation_id: &ConversationId) -> ParleyResult<Vec<AssistantTurn>>;
}

/// Author of a transcript turn as stored by the assistant service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// One stored turn of an assistant conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub role: TurnRole,
    pub content: String,
}

// ── Assistant API types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    message: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<AssistantTurn>,
}

// ── Implementation ──────────────────────────────────────────────────────────

/// HTTP client for the assistant service.
pub struct HttpAssistant {
    http: reqwest::Client,
    exchange_url: String,
    history_url: String,
    credential: Credential,
}

impl HttpAssistant {
    /// Create a new `HttpAssistant`.
    ///
    /// * `exchange_url` – Full URL of the chat endpoint (POST).
    /// * `history_url` – Full URL of the transcript endpoint (GET).
    pub fn new(
        exchange_url: impl Into<String>,
        history_url: impl Into<String>,
        credential: Credential,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            exchange_url: exchange_url.into(),
            history_url: history_url.into(),
            credential,
        }
    }

    pub fn from_config(config: &ClientConfig, credential: Credential) -> ParleyResult<Self> {
        Ok(Self::new(
            config.api_url(&config.endpoints.assistant),
            config.api_url(&config.endpoints.assistant_history),
            credential,
            client(config.request_timeout())?,
        ))
    }
}

#[async_trait]
impl AssistantTransport for HttpAssistant {
    async fn exchange(
        &self,
        conversation_id: &ConversationId,
        message: &str,
    ) -> ParleyResult<String> {
        let payload = ExchangeRequest {
            message,
            conversation_id: conversation_id.as_str(),
        };

        let response = self
            .http
            .post(&self.exchange_url)
            .bearer_auth(self.credential.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ParleyError::Exchange(format!("assistant request failed: {e}")))?;

        let body: ExchangeResponse = ensure_success(response, ParleyError::Exchange)
            .await?
            .json()
            .await
            .map_err(|e| ParleyError::Exchange(format!("assistant reply unreadable: {e}")))?;

        debug!(
            conversation_id = %conversation_id,
            reply_len = body.response.len(),
            "Assistant replied"
        );
        Ok(body.response)
    }

    async fn history(&self, conversation_id: &ConversationId) -> ParleyResult<Vec<AssistantTurn>> {
        let response = self
            .http
            .get(&self.history_url)
            .bearer_auth(self.credential.bearer())
            .query(&[("conversation_id", conversation_id.as_str())])
            .send()
            .await
            .map_err(|e| ParleyError::Exchange(format!("history request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body: HistoryResponse = ensure_success(response, ParleyError::Exchange)
            .await?
            .json()
            .await
            .map_err(|e| ParleyError::Exchange(format!("history unreadable: {e}")))?;
        Ok(body.messages)
    }
}
