// src/core/cost.rs — Cost estimation for reporting

use crate::provider::TokenUsage;

/// Accumulates usage and estimated spend across one run.
#[derive(Debug, Default)]
pub struct RunCost {
    pub total_usd: f64,
    pub calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl RunCost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model: &str, usage: &TokenUsage) {
        self.total_usd += calculate_cost(model, usage);
        self.calls += 1;
        self.prompt_tokens += usage.prompt_tokens as u64;
        self.completion_tokens += usage.completion_tokens as u64;
    }

    pub fn summary(&self) -> String {
        format!(
            "${:.4} total ({} calls, {}in/{}out tokens)",
            self.total_usd, self.calls, self.prompt_tokens, self.completion_tokens
        )
    }
}

/// Calculate cost in USD for a given model and token usage.
pub fn calculate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let (input_price, output_price) = model_pricing(model);
    let input_cost = (usage.prompt_tokens as f64 / 1_000_000.0) * input_price;
    let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_price;
    input_cost + output_cost
}

/// Returns (input_price_per_mtok, output_price_per_mtok).
pub fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
        m if m.contains("gpt-4.1") => (2.0, 8.0),
        m if m.contains("gpt-4o-mini") => (0.15, 0.6),
        m if m.contains("gpt-4o") => (2.5, 10.0),
        m if m.contains("o3-mini") => (1.1, 4.4),
        m if m.contains("o4-mini") => (1.1, 4.4),

        // Embeddings (output side is free)
        m if m.contains("text-embedding-3-large") => (0.13, 0.0),
        m if m.contains("text-embedding-3-small") => (0.02, 0.0),

        // Default: assume moderate pricing
        _ => (1.0, 3.0),
    }
}
