//! Structured-output generation boundary.
//!
//! The adjudicator only needs "prompt + schema in, schema-shaped JSON and token usage out".
//! [`GenaiGenerator`] routes through `genai`; [`MockStructuredGenerator`] answers offline.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat, JsonSpec};
use serde_json::Value;

use super::error::{AdjudicationError, AdjudicationResult};
use super::types::TokenUsage;

#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    pub system: String,
    pub instructions: String,
    /// Batch document appended after the instructions.
    pub payload: Value,
    pub schema_name: String,
    pub schema: Value,
}

impl StructuredRequest {
    pub fn user_prompt(&self) -> String {
        format!("{}\n\n{}", self.instructions, self.payload)
    }
}

#[derive(Debug, Clone)]
pub struct StructuredResponse {
    pub value: Value,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> AdjudicationResult<StructuredResponse>;
}

/// Provider-agnostic generator backed by `genai` (model name selects the adapter).
pub struct GenaiGenerator {
    client: Client,
}

impl GenaiGenerator {
    pub fn new() -> Self {
        Self {
            client: Client::default(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for GenaiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn token_count(v: Option<i32>) -> u64 {
    v.map(|n| n.max(0) as u64).unwrap_or(0)
}

#[async_trait]
impl StructuredGenerator for GenaiGenerator {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> AdjudicationResult<StructuredResponse> {
        let chat = ChatRequest::new(vec![
            ChatMessage::system(request.system.clone()),
            ChatMessage::user(request.user_prompt()),
        ]);
        let options = ChatOptions::default()
            .with_temperature(0.0)
            .with_response_format(ChatResponseFormat::JsonSpec(JsonSpec::new(
                request.schema_name.clone(),
                request.schema.clone(),
            )));

        let resp = self
            .client
            .exec_chat(&request.model, chat, Some(&options))
            .await
            .map_err(|e| AdjudicationError::Provider {
                model: request.model.clone(),
                reason: e.to_string(),
            })?;

        let usage = TokenUsage::new(
            token_count(resp.usage.prompt_tokens),
            token_count(resp.usage.completion_tokens),
        );

        let text = resp
            .first_text()
            .ok_or_else(|| AdjudicationError::InvalidResponse {
                reason: "empty completion".to_string(),
            })?;
        let value = serde_json::from_str(strip_code_fence(text))?;

        Ok(StructuredResponse { value, usage })
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockStructuredGenerator};

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::{StructuredGenerator, StructuredRequest, StructuredResponse};
    use crate::adjudication::error::{AdjudicationError, AdjudicationResult};
    use crate::adjudication::types::{PromptPayload, ResponseEnvelope, ResponseRow, TokenUsage};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockBehavior {
        /// Choose the candidate at this 1-based rank (clamped to the last one).
        PickRank(usize),
        /// Answer every item with a leaf that was never offered.
        Hallucinate,
        /// Answer only the first item of each batch.
        DropAllButFirst,
        /// Return a body that doesn't match the schema.
        Malformed,
        /// Fail every call.
        Fail,
    }

    /// Offline generator that counts calls and in-flight requests.
    pub struct MockStructuredGenerator {
        behavior: MockBehavior,
        fail_first: usize,
        delay: Option<Duration>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockStructuredGenerator {
        pub const INPUT_TOKENS_PER_ITEM: u64 = 100;
        pub const OUTPUT_TOKENS_PER_ITEM: u64 = 20;

        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                fail_first: 0,
                delay: None,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        /// Fails the first `n` calls before behaving normally.
        pub fn failing_first(mut self, n: usize) -> Self {
            self.fail_first = n;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn answer(&self, payload: &PromptPayload) -> serde_json::Value {
            let rows: Vec<ResponseRow> = payload
                .items
                .iter()
                .enumerate()
                .filter(|(i, _)| self.behavior != MockBehavior::DropAllButFirst || *i == 0)
                .filter_map(|(_, item)| {
                    let rank = match self.behavior {
                        MockBehavior::PickRank(rank) => rank,
                        _ => 1,
                    };
                    let idx = rank.clamp(1, item.candidates.len().max(1)) - 1;
                    let mut row = ResponseRow::choosing(&item.id, item.candidates.get(idx)?);
                    if self.behavior == MockBehavior::Hallucinate {
                        row.sous_famille_code = "999".to_string();
                        row.sous_famille_name = "CATEGORIE INVENTEE".to_string();
                        row.full_path = format!("{} › CATEGORIE INVENTEE", row.famille_name);
                    }
                    Some(row)
                })
                .collect();
            serde_json::to_value(ResponseEnvelope { results: rows }).unwrap_or_default()
        }
    }

    #[async_trait]
    impl StructuredGenerator for MockStructuredGenerator {
        async fn generate_structured(
            &self,
            request: &StructuredRequest,
        ) -> AdjudicationResult<StructuredResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if call < self.fail_first || self.behavior == MockBehavior::Fail {
                return Err(AdjudicationError::Provider {
                    model: request.model.clone(),
                    reason: "mock outage".to_string(),
                });
            }

            let payload: PromptPayload = serde_json::from_value(request.payload.clone())?;
            let n = payload.items.len() as u64;
            let usage = TokenUsage::new(
                n * Self::INPUT_TOKENS_PER_ITEM,
                n * Self::OUTPUT_TOKENS_PER_ITEM,
            );

            let value = match self.behavior {
                MockBehavior::Malformed => json!({ "answer": "SODAS COLA" }),
                _ => self.answer(&payload),
            };
            Ok(StructuredResponse { value, usage })
        }
    }
}
