//! Per-model token pricing

use serde::Serialize;

use crate::core::models::TokenCounts;

/// USD price per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Cost in USD of a single call
    pub fn cost(&self, tokens: TokenCounts) -> f64 {
        let input = tokens.input_tokens as f64 / 1_000_000.0 * self.input_per_million;
        let output = tokens.output_tokens as f64 / 1_000_000.0 * self.output_per_million;
        input + output
    }
}

/// Known models and their prices
const MODEL_PRICING: &[(&str, ModelPricing)] = &[
    // Main office model
    (
        "gpt-4.1",
        ModelPricing {
            input_per_million: 3.00,
            output_per_million: 12.00,
        },
    ),
    // Premium for complex files (estimated)
    (
        "gpt-5.2",
        ModelPricing {
            input_per_million: 20.00,
            output_per_million: 80.00,
        },
    ),
    // Fast & economical
    (
        "gpt-4o-mini",
        ModelPricing {
            input_per_million: 0.150,
            output_per_million: 0.600,
        },
    ),
];

/// Find the pricing for a model id
pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    MODEL_PRICING
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, pricing)| *pricing)
}

/// All priced model ids
pub fn priced_models() -> impl Iterator<Item = &'static str> {
    MODEL_PRICING.iter().map(|(id, _)| *id)
}
