// src/evaluator/mod.rs — Semantic similarity scoring

pub mod bertscore;
pub mod encoder;

pub use bertscore::{aggregate, greedy_match, ScoreSummary, SemanticScorer, SimilarityScore};

use crate::infra::errors::CaseforgeError;

/// Text-pair similarity backend. The real implementation runs a local ONNX
/// encoder; tests substitute their own.
pub trait Scorer: Send + Sync {
    fn score(&self, reference: &str, candidate: &str) -> Result<SimilarityScore, CaseforgeError>;
}
