//! Built-in endpoint reference for the probe UI.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// Reference entry for one backend endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDoc {
    /// HTTP method
    pub method: &'static str,
    /// Request path
    pub path: &'static str,
    /// One-line description
    pub summary: &'static str,
    /// Example request body, when the endpoint takes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_body: Option<&'static str>,
}

/// Lazily built catalog of known Ollama endpoints.
///
/// The catalog is assembled on first access and cached; `invalidate`
/// drops the cache so the next access rebuilds it.
pub struct EndpointDocs {
    cache: RwLock<Option<HashMap<&'static str, EndpointDoc>>>,
}

impl EndpointDocs {
    /// Create an empty (unbuilt) catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(None),
        }
    }

    /// Look up the reference entry for a path
    #[must_use]
    pub fn get(&self, path: &str) -> Option<EndpointDoc> {
        self.ensure_built();
        self.cache
            .read()
            .as_ref()
            .and_then(|docs| docs.get(path).cloned())
    }

    /// All known entries, sorted by path
    #[must_use]
    pub fn all(&self) -> Vec<EndpointDoc> {
        self.ensure_built();
        let guard = self.cache.read();
        let mut docs: Vec<EndpointDoc> = guard
            .as_ref()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by_key(|d| d.path);
        docs
    }

    /// Drop the cached catalog
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    fn ensure_built(&self) {
        if self.cache.read().is_some() {
            return;
        }
        let mut guard = self.cache.write();
        if guard.is_none() {
            *guard = Some(build_catalog());
        }
    }
}

impl Default for EndpointDocs {
    fn default() -> Self {
        Self::new()
    }
}

fn build_catalog() -> HashMap<&'static str, EndpointDoc> {
    let entries = [
        EndpointDoc {
            method: "GET",
            path: "/api/tags",
            summary: "List models available locally",
            example_body: None,
        },
        EndpointDoc {
            method: "GET",
            path: "/api/version",
            summary: "Report the server version",
            example_body: None,
        },
        EndpointDoc {
            method: "GET",
            path: "/api/ps",
            summary: "List models currently loaded into memory",
            example_body: None,
        },
        EndpointDoc {
            method: "POST",
            path: "/api/chat",
            summary: "Generate the next message in a chat, streamed as NDJSON",
            example_body: Some(
                r#"{"model":"llama3","messages":[{"role":"user","content":"Hello"}]}"#,
            ),
        },
        EndpointDoc {
            method: "POST",
            path: "/api/generate",
            summary: "Generate a completion for a raw prompt",
            example_body: Some(r#"{"model":"llama3","prompt":"Why is the sky blue?"}"#),
        },
        EndpointDoc {
            method: "POST",
            path: "/api/show",
            summary: "Show details for a model, including parameters and template",
            example_body: Some(r#"{"model":"llama3"}"#),
        },
        EndpointDoc {
            method: "POST",
            path: "/api/embed",
            summary: "Generate embeddings for the given input",
            example_body: Some(r#"{"model":"all-minilm","input":"text to embed"}"#),
        },
        EndpointDoc {
            method: "POST",
            path: "/api/pull",
            summary: "Download a model from the registry, streamed progress",
            example_body: Some(r#"{"model":"llama3"}"#),
        },
        EndpointDoc {
            method: "DELETE",
            path: "/api/delete",
            summary: "Delete a local model",
            example_body: Some(r#"{"model":"llama3"}"#),
        },
    ];
    entries.into_iter().map(|d| (d.path, d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_path() {
        let docs = EndpointDocs::new();
        let chat = docs.get("/api/chat").expect("chat entry");
        assert_eq!(chat.method, "POST");
        assert!(chat.example_body.is_some());
        assert!(docs.get("/api/unknown").is_none());
    }

    #[test]
    fn all_is_sorted_by_path() {
        let docs = EndpointDocs::new();
        let all = docs.all();
        assert!(!all.is_empty());
        let paths: Vec<_> = all.iter().map(|d| d.path).collect();
        let mut sorted = paths.clone();
        sorted.sort_unstable();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn invalidate_then_rebuild() {
        let docs = EndpointDocs::new();
        assert!(docs.get("/api/tags").is_some());
        docs.invalidate();
        assert!(docs.get("/api/tags").is_some());
    }
}
