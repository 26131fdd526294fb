//! Token and cost estimation.
//!
//! The orchestrator never receives exact token counts from most backends (only
//! Claude's stream-json mode reports real usage), so every turn's
//! `input_tokens`/`output_tokens` are estimated from text length. Cost is then
//! derived from the estimated tokens against a small built-in pricing table.

use std::collections::HashMap;

/// Rough characters-per-token ratio for a whitespace-separated natural
/// language/code mix. This is the same order of magnitude most tokenizers
/// land on (English prose averages ~4 chars/token); it is deliberately not
/// model-specific since the orchestrator talks to CLIs, not tokenizer APIs.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimates the number of tokens in `text`.
///
/// Never panics, never returns zero for non-empty input (at least one token
/// per non-empty string, so a one-word prompt doesn't cost-estimate as free).
pub fn estimate_tokens(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count() as f64;
    ((chars / CHARS_PER_TOKEN).ceil() as u64).max(1)
}

/// Estimates input tokens over a concatenated transcript.
pub fn estimate_transcript_tokens(lines: &[String]) -> u64 {
    estimate_tokens(&lines.join("\n"))
}

/// Per-million-token pricing for one model, in USD.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Pricing-table-backed cost estimator.
///
/// The pricing table is the sole source of truth for cost — there is no
/// fallback legacy estimator. Unknown models price at zero rather than
/// erroring.
#[derive(Debug, Clone)]
pub struct CostEstimator {
    table: HashMap<String, ModelPricing>,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::with_default_table()
    }
}

impl CostEstimator {
    pub fn new(table: HashMap<String, ModelPricing>) -> Self {
        Self { table }
    }

    /// A small built-in table covering the models the bundled adapters
    /// report by default. Not exhaustive — callers with a live pricing feed
    /// should build their own table and pass it to `new`.
    pub fn with_default_table() -> Self {
        let mut table = HashMap::new();
        table.insert(
            "claude-3-5-sonnet".to_string(),
            ModelPricing { input_per_million: 3.0, output_per_million: 15.0 },
        );
        table.insert(
            "claude-3-opus".to_string(),
            ModelPricing { input_per_million: 15.0, output_per_million: 75.0 },
        );
        table.insert(
            "claude-3-haiku".to_string(),
            ModelPricing { input_per_million: 0.25, output_per_million: 1.25 },
        );
        table.insert(
            "gpt-4o".to_string(),
            ModelPricing { input_per_million: 2.5, output_per_million: 10.0 },
        );
        table.insert(
            "gemini-1.5-pro".to_string(),
            ModelPricing { input_per_million: 1.25, output_per_million: 5.0 },
        );
        table.insert(
            "gemini-1.5-flash".to_string(),
            ModelPricing { input_per_million: 0.075, output_per_million: 0.3 },
        );
        Self { table }
    }

    /// Returns cost in USD for the given model and token counts. Returns
    /// `0.0` for a model missing from the table, never an error.
    pub fn cost(&self, model: Option<&str>, input_tokens: u64, output_tokens: u64) -> f64 {
        let Some(model) = model else { return 0.0 };
        let Some(pricing) = self.table.get(model) else {
            return 0.0;
        };
        let input_cost = (input_tokens as f64 / 1_000_000.0) * pricing.input_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * pricing.output_per_million;
        input_cost + output_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn estimate_tokens_nonempty_is_at_least_one() {
        assert_eq!(estimate_tokens("hi"), 1);
    }

    #[test]
    fn estimate_tokens_scales_with_length() {
        let short = estimate_tokens("hello");
        let long = estimate_tokens(&"hello ".repeat(100));
        assert!(long > short * 50);
    }

    #[test]
    fn cost_for_known_model() {
        let estimator = CostEstimator::with_default_table();
        let cost = estimator.cost(Some("claude-3-5-sonnet"), 1_000_000, 1_000_000);
        assert!((cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn cost_for_unknown_model_is_zero_not_error() {
        let estimator = CostEstimator::with_default_table();
        assert_eq!(estimator.cost(Some("made-up-model-9000"), 1000, 1000), 0.0);
    }

    #[test]
    fn cost_for_missing_model_name_is_zero() {
        let estimator = CostEstimator::with_default_table();
        assert_eq!(estimator.cost(None, 1000, 1000), 0.0);
    }
}
