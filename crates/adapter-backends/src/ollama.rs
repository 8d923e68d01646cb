//! Translator for Ollama's native API.
//!
//! Blocking requests go to `POST /api/chat` with `stream: false` and come
//! back as one payload. Streamed requests use the same endpoint with
//! newline-delimited JSON: every line is a partial message, and the line
//! with `done: true` is the completion signal, which becomes the single
//! terminal chunk on the adapter side.

use crate::backend::{map_transport_error, ModelBackend, DEFAULT_BACKEND_TIMEOUT};
use adapter_core::{
    AdapterError, AdapterResult, ChatChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChunkStream, FinishReason, GenerationDefaults, ModelObject, Usage,
};
use adapter_registry::{BackendKind, BackendServer};
use async_stream::try_stream;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Ollama backend configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server record id this backend was built from
    pub id: String,
    /// Root URL of the Ollama API
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<SecretString>,
    /// Request timeout
    pub timeout: Duration,
    /// Fallbacks for sampling parameters absent from requests
    pub defaults: GenerationDefaults,
}

impl OllamaConfig {
    /// Create a configuration for the given id and base URL
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            defaults: GenerationDefaults::default(),
        }
    }

    /// Snapshot a server record into a configuration
    #[must_use]
    pub fn from_server(server: &BackendServer, defaults: GenerationDefaults) -> Self {
        Self {
            id: server.id.to_string(),
            base_url: server.trimmed_base_url().to_string(),
            api_key: server.api_key.clone().map(SecretString::new),
            timeout: DEFAULT_BACKEND_TIMEOUT,
            defaults,
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }
}

/// Ollama native-API backend
pub struct OllamaBackend {
    config: OllamaConfig,
    client: Client,
}

impl OllamaBackend {
    /// Create a backend from its configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OllamaConfig) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdapterError::internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    fn request_builder(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    /// Map the inbound request into Ollama's shape.
    ///
    /// Remapping field names is the translator's whole job here; values are
    /// passed through uncoerced because the backend is the authority on
    /// validation.
    fn transform_request(&self, request: &ChatCompletionRequest, stream: bool) -> OllamaChatRequest {
        let params = request.sampling(&self.config.defaults);
        let options = OllamaOptions {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            num_ctx: params.context_length,
            num_predict: params.max_tokens,
            repeat_penalty: params.repeat_penalty,
            stop: request.stop.clone(),
        };

        OllamaChatRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream,
            options: if options.is_empty() {
                None
            } else {
                Some(options)
            },
        }
    }

    async fn error_from_response(response: reqwest::Response) -> AdapterError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<OllamaErrorBody>(&body)
            .map_or(body, |e| e.error);
        AdapterError::upstream_protocol(format!("backend returned {status}: {detail}"))
    }

    fn finish_reason(done_reason: Option<&str>) -> FinishReason {
        match done_reason {
            Some("length") => FinishReason::Length,
            _ => FinishReason::Stop,
        }
    }
}

#[async_trait::async_trait]
impl ModelBackend for OllamaBackend {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> AdapterResult<ChatCompletionResponse> {
        request.validate()?;
        let url = self.chat_url();
        let body = self.transform_request(request, false);

        debug!(model = %request.model, url = %url, "sending blocking chat to ollama");

        let response = self
            .request_builder(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let native: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::upstream_protocol(format!("malformed chat response: {e}")))?;

        let content = native.message.map(|m| m.content).unwrap_or_default();
        let usage = Usage::new(
            native.prompt_eval_count.unwrap_or(0),
            native.eval_count.unwrap_or(0),
        );

        Ok(ChatCompletionResponse::single(
            format!("chatcmpl-{}", Uuid::new_v4().simple()),
            request.model.clone(),
            Utc::now().timestamp(),
            content,
            Self::finish_reason(native.done_reason.as_deref()),
            usage,
        ))
    }

    async fn chat_stream(&self, request: &ChatCompletionRequest) -> AdapterResult<ChunkStream> {
        request.validate()?;
        let url = self.chat_url();
        let body = self.transform_request(request, true);

        debug!(model = %request.model, url = %url, "starting streamed chat to ollama");

        let response = self
            .request_builder(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let stream_id = format!("chatcmpl-{}", Uuid::new_v4().simple());
        let model = request.model.clone();
        let created = Utc::now().timestamp();

        let stream = try_stream! {
            let mut body = response.bytes_stream();
            let mut buffer = Vec::new();
            let mut finished = false;

            'outer: while let Some(piece) = body.next().await {
                let piece = piece.map_err(|e| map_transport_error(&e))?;
                buffer.extend_from_slice(&piece);

                while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    trace!(line = %line, "ollama stream line");

                    let chunk: OllamaChatResponse = serde_json::from_str(line).map_err(|e| {
                        AdapterError::upstream_protocol(format!("malformed stream line: {e}"))
                    })?;

                    if chunk.done {
                        let usage = match (chunk.prompt_eval_count, chunk.eval_count) {
                            (None, None) => None,
                            (p, c) => Some(Usage::new(p.unwrap_or(0), c.unwrap_or(0))),
                        };
                        yield ChatChunk::terminal(
                            stream_id.clone(),
                            model.clone(),
                            created,
                            Self::finish_reason(chunk.done_reason.as_deref()),
                            usage,
                        );
                        finished = true;
                        break 'outer;
                    }

                    if let Some(message) = chunk.message {
                        if !message.content.is_empty() {
                            yield ChatChunk::content(
                                stream_id.clone(),
                                model.clone(),
                                created,
                                message.content,
                            );
                        }
                    }
                }
            }

            if !finished {
                warn!("ollama stream closed without a completion marker");
                Err(AdapterError::upstream_protocol(
                    "stream ended without completion marker",
                ))?;
            }
        };

        Ok(Box::pin(stream))
    }

    async fn list_models(&self) -> AdapterResult<Vec<ModelObject>> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::upstream_protocol(format!("malformed tags response: {e}")))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelObject::new(m.name, "ollama"))
            .collect())
    }

    async fn check(&self) -> AdapterResult<String> {
        let url = format!("{}/api/version", self.config.base_url);
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let version: OllamaVersion = response
            .json()
            .await
            .map_err(|e| AdapterError::upstream_protocol(format!("malformed version response: {e}")))?;

        Ok(format!(
            "ok ({}ms, ollama {})",
            started.elapsed().as_millis(),
            version.version
        ))
    }
}

// ============================================================================
// Ollama API types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.num_ctx.is_none()
            && self.num_predict.is_none()
            && self.repeat_penalty.is_none()
            && self.stop.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}
