//! HTTP request handlers for the adapter API.

use axum::{
    extract::State,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::StreamExt;

use adapter_core::{
    ChatCompletionRequest, CorrelationId, ErrorResponse, ModelsResponse,
};
use adapter_probe::{AdHocRequest, AdHocResponse, EndpointDoc};
use adapter_telemetry::LogEntry;
use serde::Serialize;
use std::convert::Infallible;
use tracing::{debug, error, info, instrument};

use crate::{error::ApiError, state::AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Id of the pinned target server
    pub target: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: state.backend.id().to_string(),
    })
}

/// List models endpoint (OpenAI compatible)
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state.backend.list_models().await?;
    Ok(Json(ModelsResponse::new(models)))
}

/// Recent log entries, oldest first
pub async fn recent_logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.logs.snapshot())
}

/// Execute an ad-hoc diagnostic request against a registered server.
///
/// Always responds 200; failure modes live inside the result card.
#[instrument(skip(state, body), fields(method = %body.method, path = %body.path))]
pub async fn execute_probe(
    State(state): State<AppState>,
    Json(body): Json<AdHocRequest>,
) -> Json<AdHocResponse> {
    Json(state.executor.execute(&body).await)
}

/// Built-in endpoint reference catalog
pub async fn probe_docs(State(state): State<AppState>) -> Json<Vec<EndpointDoc>> {
    Json(state.docs.all())
}

/// Chat completion endpoint (OpenAI compatible)
#[instrument(skip(state, body), fields(model = %body.model))]
pub async fn chat_completion(
    State(state): State<AppState>,
    Json(body): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    let request = body;
    let correlation_id = CorrelationId::generate();

    debug!(
        correlation_id = %correlation_id,
        model = %request.model,
        streaming = request.stream,
        "processing chat completion request"
    );

    request.validate()?;

    if request.stream {
        handle_streaming_request(state, request, correlation_id).await
    } else {
        handle_blocking_request(state, request, correlation_id).await
    }
}

async fn handle_blocking_request(
    state: AppState,
    request: ChatCompletionRequest,
    correlation_id: CorrelationId,
) -> Result<Response, ApiError> {
    match state.backend.chat(&request).await {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                model = %request.model,
                completion_tokens = response.usage.completion_tokens,
                "chat completion successful"
            );
            Ok(Json(response).into_response())
        }
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                model = %request.model,
                error = %e,
                "chat completion failed"
            );
            Err(e.into())
        }
    }
}

async fn handle_streaming_request(
    state: AppState,
    request: ChatCompletionRequest,
    correlation_id: CorrelationId,
) -> Result<Response, ApiError> {
    let chunk_stream = match state.backend.chat_stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                model = %request.model,
                error = %e,
                "streaming request failed before first chunk"
            );
            return Err(e.into());
        }
    };

    // Each translated chunk becomes one SSE data event. Mid-stream failures
    // cannot change the already-sent status line, so they are delivered as
    // an error event followed by [DONE].
    let sse_stream = chunk_stream.map(move |chunk_result| match chunk_result {
        Ok(chunk) => {
            let data = serde_json::to_string(&chunk).unwrap_or_default();
            Ok::<_, Infallible>(Event::default().data(data))
        }
        Err(e) => {
            error!(correlation_id = %correlation_id, error = %e, "stream failed mid-flight");
            let body = ErrorResponse::new(e.to_string(), e.error_type());
            let data = serde_json::to_string(&body).unwrap_or_default();
            Ok(Event::default().data(data))
        }
    });

    let done_stream = futures::stream::once(async {
        Ok::<_, Infallible>(Event::default().data("[DONE]"))
    });

    Ok(Sse::new(sse_stream.chain(done_stream))
        .keep_alive(axum::response::sse::KeepAlive::default())
        .into_response())
}
