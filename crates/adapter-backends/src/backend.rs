//! The backend abstraction the lifecycle manager dispatches into.

use adapter_core::{
    AdapterError, AdapterResult, ChatCompletionRequest, ChatCompletionResponse, ChunkStream,
    GenerationDefaults, ModelObject,
};
use adapter_registry::{BackendKind, BackendServer};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for backend HTTP requests
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

/// One backend model server, seen through its protocol translator.
///
/// Implementations are stateless per request and safe to share across
/// concurrent connection handlers.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Id of the server record this backend was built from
    fn id(&self) -> &str;

    /// Protocol dialect
    fn kind(&self) -> BackendKind;

    /// Root URL of the backend API
    fn base_url(&self) -> &str;

    /// Execute a blocking chat completion: the backend's whole payload is
    /// reassembled into one OpenAI-compatible response.
    async fn chat(&self, request: &ChatCompletionRequest)
        -> AdapterResult<ChatCompletionResponse>;

    /// Execute a streamed chat completion: each backend chunk is forwarded
    /// as soon as it arrives, in emission order, ending with exactly one
    /// terminal chunk. Streams are not resumable; a mid-stream failure
    /// surfaces as a final `Err` item.
    async fn chat_stream(&self, request: &ChatCompletionRequest) -> AdapterResult<ChunkStream>;

    /// List the models the backend serves, in OpenAI list shape
    async fn list_models(&self) -> AdapterResult<Vec<ModelObject>>;

    /// Connectivity probe; returns a free-form status line on success
    async fn check(&self) -> AdapterResult<String>;
}

/// Build the translator matching a server record's dialect.
///
/// This is the snapshot boundary: the returned backend captures the
/// record's connection details at call time and is unaffected by later
/// registry edits.
pub fn backend_for(
    server: &BackendServer,
    defaults: GenerationDefaults,
) -> AdapterResult<Arc<dyn ModelBackend>> {
    match server.kind {
        BackendKind::Ollama => {
            let config = crate::ollama::OllamaConfig::from_server(server, defaults);
            Ok(Arc::new(crate::OllamaBackend::new(config)?))
        }
        BackendKind::OpenAiCompat => {
            let config = crate::openai_compat::OpenAiCompatConfig::from_server(server, defaults);
            Ok(Arc::new(crate::OpenAiCompatBackend::new(config)?))
        }
    }
}

/// Map a reqwest failure to the adapter's upstream taxonomy
pub(crate) fn map_transport_error(err: &reqwest::Error) -> AdapterError {
    if err.is_connect() || err.is_timeout() {
        AdapterError::upstream_unreachable(err.to_string())
    } else if err.is_decode() || err.is_body() {
        AdapterError::upstream_protocol(err.to_string())
    } else {
        AdapterError::upstream_unreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_matches_dialect() {
        let ollama = BackendServer::new("local", "http://127.0.0.1:11434");
        let backend = backend_for(&ollama, GenerationDefaults::default()).expect("build");
        assert_eq!(backend.kind(), BackendKind::Ollama);

        let compat = BackendServer::new("vllm", "http://127.0.0.1:8000")
            .with_kind(BackendKind::OpenAiCompat);
        let backend = backend_for(&compat, GenerationDefaults::default()).expect("build");
        assert_eq!(backend.kind(), BackendKind::OpenAiCompat);
    }

    #[test]
    fn factory_snapshot_ignores_later_edits() {
        let mut server = BackendServer::new("local", "http://127.0.0.1:11434");
        let backend = backend_for(&server, GenerationDefaults::default()).expect("build");

        server.base_url = "http://10.0.0.9:11434".to_string();
        assert_eq!(backend.base_url(), "http://127.0.0.1:11434");
    }
}
