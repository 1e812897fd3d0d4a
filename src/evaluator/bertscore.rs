// src/evaluator/bertscore.rs — Greedy token-matching similarity

use serde::{Deserialize, Serialize};

use crate::evaluator::encoder::TokenEncoder;
use crate::infra::config::ScorerConfig;
use crate::infra::errors::CaseforgeError;

/// Token-level similarity between a candidate and a reference text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Mean scores over a scored result set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub count: usize,
}

impl std::fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Average Precision: {:.2}", self.precision * 100.0)?;
        writeln!(f, "Average Recall: {:.2}", self.recall * 100.0)?;
        write!(f, "Average F1: {:.2}", self.f1 * 100.0)
    }
}

/// Compares texts by their contextual token embeddings: each candidate token
/// is matched to its most similar reference token and vice versa, so phrasing
/// differences cost little as long as the content lines up.
pub struct SemanticScorer {
    encoder: TokenEncoder,
}

impl SemanticScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self, CaseforgeError> {
        Ok(Self {
            encoder: TokenEncoder::new(config)?,
        })
    }
}

impl crate::evaluator::Scorer for SemanticScorer {
    /// Score `candidate` against `reference`. Both are treated as plain text;
    /// callers comparing JSON documents should pretty-print them first so the
    /// tokenizer sees stable, readable input.
    fn score(&self, reference: &str, candidate: &str) -> Result<SimilarityScore, CaseforgeError> {
        let encoded = self.encoder.encode(&[reference, candidate])?;
        let [reference_tokens, candidate_tokens]: [Vec<Vec<f32>>; 2] = encoded
            .try_into()
            .map_err(|_| CaseforgeError::Scorer("encoder returned wrong arity".into()))?;
        Ok(greedy_match(&candidate_tokens, &reference_tokens))
    }
}

/// Greedy soft-alignment over normalized token vectors.
///
/// Precision: mean over candidate tokens of the best cosine match among
/// reference tokens. Recall: the same with roles swapped. F1: harmonic mean,
/// defined as 0 when both sides are 0. Either side empty scores 0 across the
/// board.
pub fn greedy_match(candidate: &[Vec<f32>], reference: &[Vec<f32>]) -> SimilarityScore {
    let precision = mean_best_match(candidate, reference);
    let recall = mean_best_match(reference, candidate);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    SimilarityScore {
        precision,
        recall,
        f1,
    }
}

/// Aggregate per-record scores into run-level means.
pub fn aggregate(scores: &[SimilarityScore]) -> Result<ScoreSummary, CaseforgeError> {
    if scores.is_empty() {
        return Err(CaseforgeError::EmptyResultSet);
    }
    let n = scores.len() as f32;
    Ok(ScoreSummary {
        precision: scores.iter().map(|s| s.precision).sum::<f32>() / n,
        recall: scores.iter().map(|s| s.recall).sum::<f32>() / n,
        f1: scores.iter().map(|s| s.f1).sum::<f32>() / n,
        count: scores.len(),
    })
}

fn mean_best_match(from: &[Vec<f32>], to: &[Vec<f32>]) -> f32 {
    if from.is_empty() || to.is_empty() {
        return 0.0;
    }
    let total: f32 = from
        .iter()
        .map(|a| {
            to.iter()
                .map(|b| dot(a, b))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .sum();
    total / from.len() as f32
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
