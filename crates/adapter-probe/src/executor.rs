//! Executes ad-hoc requests against registered backends.

use crate::request::{AdHocRequest, AdHocResponse, RequestBody, ToggleEntry};
use adapter_core::AdapterResult;
use adapter_registry::BackendRegistry;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Timeout applied to every probe. Probes are interactive; a backend that
/// does not answer within this window is reported as unreachable rather
/// than left hanging.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues [`AdHocRequest`]s and renders their outcomes.
///
/// Every invocation produces an [`AdHocResponse`]. HTTP error statuses are
/// ordinary responses; only failures that prevent a response from arriving
/// at all (bad target, malformed URL, transport errors, timeout) populate
/// the error field.
pub struct RequestExecutor {
    registry: Arc<BackendRegistry>,
    client: Client,
}

impl RequestExecutor {
    /// Create an executor over the given registry
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(registry: Arc<BackendRegistry>) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| {
                adapter_core::AdapterError::internal(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { registry, client })
    }

    /// Execute one probe.
    ///
    /// Never returns `Err`; every failure mode is folded into the response
    /// so the operator always sees a result card.
    pub async fn execute(&self, request: &AdHocRequest) -> AdHocResponse {
        let started = Instant::now();

        let outcome = self.send(request).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(mut response) => {
                response.duration_ms = duration_ms;
                response
            }
            Err(message) => {
                warn!(error = %message, "probe failed");
                AdHocResponse::failed(message, duration_ms)
            }
        }
    }

    async fn send(&self, request: &AdHocRequest) -> Result<AdHocResponse, String> {
        let server = self
            .registry
            .get(&request.target_server_id)
            .map_err(|e| e.to_string())?;

        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|_| format!("invalid HTTP method: {}", request.method))?;

        let url = build_url(server.trimmed_base_url(), &request.path, &request.query_params)?;

        debug!(method = %method, url = %url, "dispatching probe");

        let mut builder = self.client.request(method, url);

        match &request.body {
            RequestBody::None => {}
            RequestBody::Raw {
                content,
                content_type,
            } => {
                builder = builder
                    .header(http::header::CONTENT_TYPE, content_type.clone())
                    .body(content.clone());
            }
            RequestBody::Form { fields } => {
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|f| (f.key.as_str(), f.value.as_str()))
                    .collect();
                builder = builder.form(&pairs);
            }
        }

        // Merged after the body with replace semantics, so an enabled
        // Content-Type entry supersedes the one the body variant implies
        // instead of being sent alongside it.
        let mut headers = HeaderMap::new();
        for entry in request.headers.iter().filter(|h| h.enabled) {
            let name = HeaderName::from_bytes(entry.key.as_bytes())
                .map_err(|_| format!("invalid header name: {}", entry.key))?;
            let value = HeaderValue::from_str(&entry.value)
                .map_err(|_| format!("invalid header value for {}", entry.key))?;
            headers.append(name, value);
        }
        builder = builder.headers(headers);

        if let Some(key) = &server.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                ToggleEntry::new(
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|e| e.to_string())?;

        Ok(AdHocResponse {
            status_code: Some(status.as_u16()),
            status_text: status.canonical_reason().map(str::to_string),
            headers,
            body,
            duration_ms: 0,
            error: None,
        })
    }
}

fn build_url(base: &str, path: &str, query: &[ToggleEntry]) -> Result<Url, String> {
    let joined = if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };

    let mut url = Url::parse(&joined).map_err(|e| format!("invalid request URL: {e}"))?;

    {
        let mut pairs = url.query_pairs_mut();
        for entry in query.iter().filter(|q| q.enabled) {
            pairs.append_pair(&entry.key, &entry.value);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
