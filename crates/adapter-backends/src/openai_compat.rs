//! Translator for backends that already expose the OpenAI wire shape.
//!
//! Translation is field-faithful: names stay as they are, with adapter
//! defaults resolved in. Streaming uses server-sent events terminated by
//! the literal `[DONE]` data line.

use crate::backend::{map_transport_error, ModelBackend, DEFAULT_BACKEND_TIMEOUT};
use adapter_core::{
    AdapterError, AdapterResult, ChatChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage, ChunkStream, FinishReason, GenerationDefaults, ModelObject, ModelsResponse,
};
use adapter_registry::{BackendKind, BackendServer};
use async_stream::try_stream;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// OpenAI-compatible backend configuration
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Server record id this backend was built from
    pub id: String,
    /// Root URL of the backend API (without the `/v1` suffix)
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<SecretString>,
    /// Request timeout
    pub timeout: Duration,
    /// Fallbacks for sampling parameters absent from requests
    pub defaults: GenerationDefaults,
}

impl OpenAiCompatConfig {
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
}

/// Backend speaking the OpenAI wire shape natively
pub struct OpenAiCompatBackend {
    config: OpenAiCompatConfig,
    client: Client,
}

impl OpenAiCompatBackend {
    /// Create a backend from its configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatConfig) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdapterError::internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn request_builder(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    fn transform_request(&self, request: &ChatCompletionRequest, stream: bool) -> CompatChatRequest {
        let params = request.sampling(&self.config.defaults);
        CompatChatRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_tokens: params.max_tokens,
            repeat_penalty: params.repeat_penalty,
            stop: request.stop.clone(),
            stream,
        }
    }

    async fn error_from_response(response: reqwest::Response) -> AdapterError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AdapterError::upstream_protocol(format!("backend returned {status}: {body}"))
    }
}

#[async_trait::async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::OpenAiCompat
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> AdapterResult<ChatCompletionResponse> {
        request.validate()?;
        let url = self.completions_url();
        let body = self.transform_request(request, false);

        debug!(model = %request.model, url = %url, "sending blocking chat to openai-compat backend");

        let response = self
            .request_builder(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::upstream_protocol(format!("malformed chat response: {e}")))
    }

    async fn chat_stream(&self, request: &ChatCompletionRequest) -> AdapterResult<ChunkStream> {
        request.validate()?;
        let url = self.completions_url();
        let body = self.transform_request(request, true);

        debug!(model = %request.model, url = %url, "starting streamed chat to openai-compat backend");

        let builder = self.request_builder(&url).json(&body);
        let event_source = EventSource::new(builder).map_err(|e| {
            AdapterError::internal(format!("failed to create event source: {e}"))
        })?;

        let stream_id = format!("chatcmpl-{}", Uuid::new_v4().simple());
        let model = request.model.clone();
        let created = Utc::now().timestamp();

        let stream = try_stream! {
            let mut source = event_source;
            let mut saw_terminal = false;

            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {
                        trace!("openai-compat stream opened");
                    }
                    Ok(Event::Message(message)) => {
                        let data = message.data.trim();
                        if data == "[DONE]" {
                            break;
                        }

                        let chunk: ChatChunk = serde_json::from_str(data).map_err(|e| {
                            AdapterError::upstream_protocol(format!(
                                "malformed stream chunk: {e}"
                            ))
                        })?;
                        saw_terminal = saw_terminal || chunk.is_terminal();
                        yield chunk;
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => {
                        break;
                    }
                    Err(e) => {
                        Err(AdapterError::upstream_unreachable(format!(
                            "stream error: {e}"
                        )))?;
                    }
                }
            }

            // A well-behaved backend sends its finish chunk before [DONE];
            // synthesize one if it closed without it so clients always see
            // exactly one terminal marker.
            if !saw_terminal {
                warn!("openai-compat stream ended without a finish chunk");
                yield ChatChunk::terminal(
                    stream_id.clone(),
                    model.clone(),
                    created,
                    FinishReason::Stop,
                    None,
                );
            }
        };

        Ok(Box::pin(stream))
    }

    async fn list_models(&self) -> AdapterResult<Vec<ModelObject>> {
        let url = format!("{}/v1/models", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::upstream_protocol(format!("malformed models response: {e}")))?;

        Ok(models.data)
    }

    async fn check(&self) -> AdapterResult<String> {
        let url = format!("{}/v1/models", self.config.base_url);
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

        Ok(format!("ok ({}ms)", started.elapsed().as_millis()))
    }
}

// ============================================================================
// Outbound wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CompatChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_absent_parameters() {
        let mut config = OpenAiCompatConfig::new("s", "http://127.0.0.1:8000");
        config.defaults.temperature = Some(0.7);
        config.defaults.max_tokens = Some(512);

        let backend = OpenAiCompatBackend::new(config).expect("backend");
        let request = ChatCompletionRequest::new("m", vec![ChatMessage::user("hi")]);
        let outbound = backend.transform_request(&request, true);

        assert_eq!(outbound.temperature, Some(0.7));
        assert_eq!(outbound.max_tokens, Some(512));
        assert!(outbound.stream);
    }

    #[test]
    fn context_length_is_dropped_for_compat_backends() {
        // The OpenAI shape has no context-window field; the translator drops
        // it rather than inventing one the backend would reject.
        let backend =
            OpenAiCompatBackend::new(OpenAiCompatConfig::new("s", "http://127.0.0.1:8000"))
                .expect("backend");
        let mut request = ChatCompletionRequest::new("m", vec![ChatMessage::user("hi")]);
        request.context_length = Some(4096);

        let outbound = backend.transform_request(&request, false);
        let json = serde_json::to_value(&outbound).expect("serialize");
        assert!(json.get("context_length").is_none());
        assert!(json.get("num_ctx").is_none());
    }
}
