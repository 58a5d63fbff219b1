use crate::error::CompletionError;
use crate::llm_provider::*;
use crate::retry::{BackoffPolicy, FailureKind, RetryDecision, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    /// Model used when the request does not override it
    pub model: String,
    /// Bearer credential; calls fail fast without it
    pub api_key: Option<SecretString>,
    /// Hard limit for a single attempt
    pub timeout: Duration,
    /// Provider name for display purposes
    pub provider_name: String,
}

impl Default for OpenAICompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout: Duration::from_secs(300),
            provider_name: "openai-compatible".to_string(),
        }
    }
}

/// Raw HTTP outcome of one POST
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Failures raised below the HTTP status level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    RateLimited(String),
    Connection(String),
}

/// Sends a chat completions request; swapped out in tests
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post_chat(
        &self,
        url: &str,
        api_key: &SecretString,
        request: &ChatCompletionsRequest,
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> LLMResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                CompletionError::ServiceUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionTransport for ReqwestTransport {
    async fn post_chat(
        &self,
        url: &str,
        api_key: &SecretString,
        request: &ChatCompletionsRequest,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        Ok(TransportResponse { status, body })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }
    let message = error.to_string();
    if message.to_lowercase().contains("rate limit") {
        TransportError::RateLimited(message)
    } else {
        TransportError::Connection(message)
    }
}

struct AttemptFailure {
    kind: FailureKind,
    error: CompletionError,
}

impl AttemptFailure {
    fn new(kind: FailureKind, error: CompletionError) -> Self {
        Self { kind, error }
    }
}

/// Chat completions client with per-attempt timeout and policy-driven retries
pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    transport: Arc<dyn CompletionTransport>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl OpenAICompatibleProvider {
    /// Create a provider talking HTTP through reqwest
    pub fn new(config: OpenAICompatibleConfig) -> LLMResult<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(
        config: OpenAICompatibleConfig,
        transport: Arc<dyn CompletionTransport>,
    ) -> Self {
        Self {
            config,
            transport,
            retry_policy: Arc::new(BackoffPolicy::default()),
        }
    }

    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send a request with retry logic
    async fn send_request(
        &self,
        request: &ChatCompletionsRequest,
    ) -> LLMResult<ChatCompletionsResponse> {
        let api_key = match self.config.api_key.as_ref() {
            Some(key) if !key.expose_secret().trim().is_empty() => key,
            _ => {
                return Err(CompletionError::ServiceUnavailable(format!(
                    "no API credential configured for {}",
                    self.config.provider_name
                )))
            }
        };

        let max_attempts = self.retry_policy.max_attempts().max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            match self.try_request(api_key, request).await {
                Ok(response) => {
                    let usage = response.usage.clone().unwrap_or_default();
                    info!(
                        provider = %self.config.provider_name,
                        model = %request.model,
                        attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "completion succeeded"
                    );
                    return Ok(response);
                }
                Err(failure) => {
                    let decision = self.retry_policy.decide(failure.kind, attempt);
                    warn!(
                        provider = %self.config.provider_name,
                        attempt,
                        max_attempts,
                        duration_ms = started.elapsed().as_millis() as u64,
                        error = %failure.error,
                        "completion attempt failed"
                    );
                    last_error = Some(failure.error);

                    match decision {
                        RetryDecision::RetryAfter(delay) => {
                            debug!("retrying in {:?}", delay);
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::GiveUp => break,
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CompletionError::ServiceUnavailable("all retry attempts failed".to_string())
        }))
    }

    /// Try a single request
    async fn try_request(
        &self,
        api_key: &SecretString,
        request: &ChatCompletionsRequest,
    ) -> Result<ChatCompletionsResponse, AttemptFailure> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let outcome = timeout(
            self.config.timeout,
            self.transport.post_chat(&url, api_key, request),
        )
        .await;

        let response = match outcome {
            Err(_) | Ok(Err(TransportError::Timeout)) => {
                return Err(AttemptFailure::new(
                    FailureKind::Timeout,
                    CompletionError::Timeout(self.config.timeout),
                ))
            }
            Ok(Err(TransportError::RateLimited(message))) => {
                return Err(AttemptFailure::new(
                    FailureKind::RateLimitSignal,
                    CompletionError::RateLimited(message),
                ))
            }
            Ok(Err(TransportError::Connection(message))) => {
                return Err(AttemptFailure::new(
                    FailureKind::Fatal,
                    CompletionError::ServiceUnavailable(message),
                ))
            }
            Ok(Ok(response)) => response,
        };

        if response.status == 429 {
            return Err(AttemptFailure::new(
                FailureKind::RateLimitStatus,
                CompletionError::RateLimited(error_message(&response)),
            ));
        }

        if !(200..300).contains(&response.status) {
            return Err(AttemptFailure::new(
                FailureKind::Fatal,
                CompletionError::Unauthorized {
                    status: response.status,
                    message: error_message(&response),
                },
            ));
        }

        let parsed: ChatCompletionsResponse =
            serde_json::from_str(&response.body).map_err(|e| {
                AttemptFailure::new(
                    FailureKind::Fatal,
                    CompletionError::BadGateway(format!(
                        "Failed to parse {} response: {}",
                        self.config.provider_name, e
                    )),
                )
            })?;

        if parsed.content().is_none() {
            return Err(AttemptFailure::new(
                FailureKind::Fatal,
                CompletionError::BadGateway("No choices in response".to_string()),
            ));
        }

        Ok(parsed)
    }
}

/// Provider error text, preferring `error.message` from a JSON body
fn error_message(response: &TransportResponse) -> String {
    serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.body))
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let request = ChatCompletionsRequest {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        };

        let response = self.send_request(&request).await?;
        let usage = response.usage.clone();
        let (content, finish_reason) = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content.map(|c| (c, choice.finish_reason)))
            .ok_or_else(|| CompletionError::BadGateway("No choices in response".to_string()))?;

        Ok(LLMResponse {
            content,
            total_tokens: usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().map(|u| u.completion_tokens),
            finish_reason,
            model: response.model.unwrap_or(request.model),
        })
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// API request/response types for Chat Completions API

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionsRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

impl ChatCompletionsResponse {
    fn content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}
