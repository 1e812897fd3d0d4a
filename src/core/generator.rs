// src/core/generator.rs — Retrieval-augmented test-case generation

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::cost::calculate_cost;
use crate::core::parser::extract_json;
use crate::core::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::core::suite::TestSuite;
use crate::core::telemetry::Telemetry;
use crate::index::retrieval::Retriever;
use crate::infra::config::{Config, GenerationConfig};
use crate::infra::errors::CaseforgeError;
use crate::provider::{ChatRequest, Message, ModelProvider, StopReason, TokenUsage};

/// One finished generation with its bookkeeping.
#[derive(Debug)]
pub struct Generation {
    pub suite: TestSuite,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub latency: Duration,
}

/// Drives one use case through retrieval, prompting, the model call and
/// response normalization.
pub struct Generator {
    provider: Arc<dyn ModelProvider>,
    retriever: Option<Retriever>,
    telemetry: Option<Telemetry>,
    model: String,
    params: GenerationConfig,
    top_k: usize,
}

impl Generator {
    pub fn new(provider: Arc<dyn ModelProvider>, config: &Config) -> Self {
        Self {
            provider,
            retriever: None,
            telemetry: None,
            model: config.provider.model.clone(),
            params: config.generation.clone(),
            top_k: config.retrieval.top_k,
        }
    }

    /// Attach a retriever so calls with `use_embedding` can pull context.
    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Attach a statistics sink; one row is recorded per model call.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Generate test cases for `usecase`. With `use_embedding` the prompt's
    /// use-case slot is filled with the nearest corpus entries instead of the
    /// raw input text.
    pub async fn generate(
        &self,
        usecase: &str,
        project_description: &str,
        use_embedding: bool,
    ) -> Result<Generation, CaseforgeError> {
        let context = self.context_for(usecase, use_embedding).await?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(build_prompt(&context, project_description)),
            ],
            max_tokens: Some(self.params.max_tokens),
            temperature: Some(self.params.temperature),
            top_p: Some(self.params.top_p),
        };

        let started = Instant::now();
        let response = self.provider.chat(request).await?;
        let latency = started.elapsed();

        // Bookkeeping happens before parsing so failed parses still count.
        let cost_usd = calculate_cost(&self.model, &response.usage);
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(&self.model, &response.usage, cost_usd, latency);
        }

        if matches!(response.stop_reason, StopReason::MaxTokens) {
            tracing::warn!(
                max_tokens = self.params.max_tokens,
                "model hit the token ceiling, output may be truncated"
            );
        }

        let payload = extract_json(&response.content)?;
        let value: serde_json::Value = serde_json::from_str(&payload)
            .map_err(|e| CaseforgeError::Generation(format!("model output is not valid JSON: {e}")))?;
        let suite = TestSuite::from_value(value);

        tracing::debug!(
            model = %self.model,
            cases = suite.len(),
            tokens = response.usage.total(),
            latency_ms = latency.as_millis() as u64,
            "generation complete"
        );

        Ok(Generation {
            suite,
            usage: response.usage,
            cost_usd,
            latency,
        })
    }

    /// Resolve the text that fills the prompt's use-case slot.
    async fn context_for(
        &self,
        usecase: &str,
        use_embedding: bool,
    ) -> Result<String, CaseforgeError> {
        if !use_embedding {
            tracing::debug!("retrieval disabled, prompting with the raw use case");
            return Ok(usecase.to_string());
        }

        let retriever = self.retriever.as_ref().ok_or_else(|| {
            CaseforgeError::Retrieval("retrieval requested but no index is loaded".into())
        })?;

        let hits = retriever.retrieve_similar(usecase, self.top_k).await?;
        tracing::debug!(hits = hits.len(), "retrieved context");

        // Entries concatenate directly; each one is a complete JSON document.
        Ok(hits.into_iter().map(|h| h.text).collect())
    }
}
