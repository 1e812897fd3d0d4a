// src/index/mod.rs — Flat inner-product similarity index
//
// Exact nearest-neighbor search over L2-normalized vectors, so inner
// product equals cosine similarity. The corpus stays small enough
// (hundreds of entries) that a linear scan beats any ANN structure.
// Persisted as a vectors file + metadata file pair; a count mismatch
// between the two is fatal on load.

pub mod retrieval;

use std::path::Path;

use crate::corpus::CorpusEntry;
use crate::infra::errors::CaseforgeError;
use crate::provider::ModelProvider;

const VECTORS_FILE: &str = "corpus.vectors.json";
const META_FILE: &str = "corpus.meta.json";

#[derive(Debug)]
pub struct EmbeddingIndex {
    vectors: Vec<Vec<f32>>,
    entries: Vec<CorpusEntry>,
}

impl EmbeddingIndex {
    /// Embed all entries in batches and build the index. Vectors are
    /// normalized at insertion; input order is preserved.
    pub async fn build(
        entries: Vec<CorpusEntry>,
        provider: &dyn ModelProvider,
        model: &str,
        batch_size: usize,
    ) -> Result<Self, CaseforgeError> {
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(entries.len());

        for batch in entries.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|e| e.text.as_str()).collect();
            let embedded = provider
                .embed(model, &texts)
                .await
                .map_err(|e| CaseforgeError::Retrieval(format!("embedding request failed: {}", e)))?;

            for vector in embedded {
                if let Some(first) = vectors.first() {
                    if vector.len() != first.len() {
                        return Err(CaseforgeError::Retrieval(format!(
                            "inconsistent embedding dimensions: {} vs {}",
                            first.len(),
                            vector.len()
                        )));
                    }
                }
                vectors.push(normalize_l2(vector));
            }
        }

        Self::from_parts(vectors, entries)
    }

    /// Assemble an index from already-normalized vectors and their
    /// parallel metadata.
    pub fn from_parts(
        vectors: Vec<Vec<f32>>,
        entries: Vec<CorpusEntry>,
    ) -> Result<Self, CaseforgeError> {
        if vectors.len() != entries.len() {
            return Err(CaseforgeError::IndexMismatch {
                vectors: vectors.len(),
                entries: entries.len(),
            });
        }
        Ok(Self { vectors, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, idx: usize) -> Option<&CorpusEntry> {
        self.entries.get(idx)
    }

    /// Exact top-k scan. Results come back as (index, score) in
    /// descending score order; ties keep insertion order. Returns
    /// `min(top_k, len)` results.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        scored
    }

    /// Write the vectors + metadata pair into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), CaseforgeError> {
        std::fs::create_dir_all(dir)?;

        let vectors_json = serde_json::to_string(&self.vectors)
            .map_err(|e| CaseforgeError::Persistence(format!("serialize vectors: {}", e)))?;
        let meta_json = serde_json::to_string(&self.entries)
            .map_err(|e| CaseforgeError::Persistence(format!("serialize metadata: {}", e)))?;

        std::fs::write(dir.join(VECTORS_FILE), vectors_json)?;
        std::fs::write(dir.join(META_FILE), meta_json)?;

        tracing::info!(entries = self.entries.len(), dir = %dir.display(), "Index saved");
        Ok(())
    }

    /// Load the pair back. Fails when either file is missing or when the
    /// two files disagree on entry count.
    pub fn load(dir: &Path) -> Result<Self, CaseforgeError> {
        let vectors_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(META_FILE);

        let vectors_json = std::fs::read_to_string(&vectors_path).map_err(|e| {
            CaseforgeError::Retrieval(format!(
                "cannot read index vectors at {}: {}",
                vectors_path.display(),
                e
            ))
        })?;
        let meta_json = std::fs::read_to_string(&meta_path).map_err(|e| {
            CaseforgeError::Retrieval(format!(
                "cannot read index metadata at {}: {}",
                meta_path.display(),
                e
            ))
        })?;

        let vectors: Vec<Vec<f32>> = serde_json::from_str(&vectors_json)
            .map_err(|e| CaseforgeError::Retrieval(format!("corrupt index vectors: {}", e)))?;
        let entries: Vec<CorpusEntry> = serde_json::from_str(&meta_json)
            .map_err(|e| CaseforgeError::Retrieval(format!("corrupt index metadata: {}", e)))?;

        Self::from_parts(vectors, entries)
    }
}

/// L2 normalize a vector in place. Zero vectors pass through unchanged.
pub fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm_sq: f32 = v.iter().fold(0.0, |acc, &x| acc + x * x);
    if norm_sq > 0.0 {
        let inv_norm = 1.0 / norm_sq.sqrt();
        v.iter_mut().for_each(|x| *x *= inv_norm);
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
