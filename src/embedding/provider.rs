//! Embedding providers.
//!
//! `HttpEmbeddingProvider` talks to any OpenAI-compatible `/embeddings` endpoint.
//! `MockEmbeddingProvider` is a deterministic offline stand-in.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::error::{EmbeddingError, EmbeddingResult};

#[async_trait]
/// Turns texts into vectors with a named model.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns one vector per input, in input order.
    async fn embed(&self, model: &str, inputs: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;
}

/// OpenAI-compatible embeddings client.
pub struct HttpEmbeddingProvider {
    http: HttpClient,
    endpoint: String,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> EmbeddingResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                EmbeddingError::InvalidConfig {
                    reason: format!("invalid API key header: {e}"),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, model: &str, inputs: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&EmbeddingRequest {
                model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Request {
                model: model.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Status {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse =
            resp.json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    model: model.to_string(),
                    reason: e.to_string(),
                })?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != inputs.len() {
            return Err(EmbeddingError::InvalidResponse {
                model: model.to_string(),
                reason: format!(
                    "{} embeddings for {} inputs",
                    parsed.data.len(),
                    inputs.len()
                ),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::EmbeddingProvider;
    use crate::embedding::error::{EmbeddingError, EmbeddingResult};
    use crate::normalize::tokenize;

    /// Bag-of-tokens hashing embedder.
    ///
    /// Each normalized token bumps one BLAKE3-selected dimension, so texts sharing tokens
    /// get a positive cosine. Models listed as failing return a 503-style error.
    pub struct MockEmbeddingProvider {
        dim: usize,
        failing: HashSet<String>,
        delay: Option<Duration>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub const DEFAULT_DIM: usize = 256;

        pub fn new() -> Self {
            Self::with_dim(Self::DEFAULT_DIM)
        }

        pub fn with_dim(dim: usize) -> Self {
            Self {
                dim: dim.max(1),
                failing: HashSet::new(),
                delay: None,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn failing_model(mut self, model: impl Into<String>) -> Self {
            self.failing.insert(model.into());
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Models requested so far, one entry per call.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        /// Highest number of simultaneous `embed` calls observed.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn vector_for(text: &str, dim: usize) -> Vec<f32> {
            let mut v = vec![0.0f32; dim];
            for token in tokenize(text) {
                let digest = blake3::hash(token.as_bytes());
                let mut bucket = [0u8; 8];
                bucket.copy_from_slice(&digest.as_bytes()[..8]);
                let idx = (u64::from_le_bytes(bucket) % dim as u64) as usize;
                v[idx] += 1.0;
            }
            v
        }
    }

    impl Default for MockEmbeddingProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, model: &str, inputs: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
            self.calls.lock().push(model.to_string());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(model) {
                return Err(EmbeddingError::Status {
                    model: model.to_string(),
                    status: 503,
                    body: "mock outage".to_string(),
                });
            }

            Ok(inputs
                .iter()
                .map(|text| Self::vector_for(text, self.dim))
                .collect())
        }
    }
}
