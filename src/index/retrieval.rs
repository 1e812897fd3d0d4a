// src/index/retrieval.rs — Query-time retrieval over the embedding index

use std::sync::Arc;

use super::{normalize_l2, EmbeddingIndex};
use crate::corpus::EntryKind;
use crate::infra::errors::CaseforgeError;
use crate::provider::ModelProvider;

/// One retrieved corpus entry with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub text: String,
    pub kind: EntryKind,
    pub score: f32,
}

pub struct Retriever {
    index: EmbeddingIndex,
    provider: Arc<dyn ModelProvider>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(
        index: EmbeddingIndex,
        provider: Arc<dyn ModelProvider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            index,
            provider,
            embedding_model: embedding_model.into(),
        }
    }

    /// Embed one query and return its top-k nearest corpus entries.
    pub async fn retrieve_similar(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<Retrieved>, CaseforgeError> {
        let embedded = self
            .provider
            .embed(&self.embedding_model, &[query])
            .await
            .map_err(|e| CaseforgeError::Retrieval(format!("query embedding failed: {}", e)))?;

        let query_vec = embedded
            .into_iter()
            .next()
            .ok_or_else(|| CaseforgeError::Retrieval("empty embedding response".into()))?;
        let query_vec = normalize_l2(query_vec);

        let results = self
            .index
            .search(&query_vec, top_k)
            .into_iter()
            .filter_map(|(idx, score)| {
                self.index.entry(idx).map(|entry| Retrieved {
                    text: entry.text.clone(),
                    kind: entry.kind,
                    score,
                })
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusEntry;
    use crate::provider::{ChatRequest, ChatResponse};
    use async_trait::async_trait;

    /// Maps fixed texts to fixed vectors, standing in for the embedding API.
    struct EmbedStub;

    fn stub_vector(text: &str) -> Vec<f32> {
        match text {
            "login use case" => vec![1.0, 0.0],
            "payment use case" => vec![0.0, 1.0],
            _ => vec![0.9, 0.1],
        }
    }

    #[async_trait]
    impl ModelProvider for EmbedStub {
        fn name(&self) -> &str {
            "stub"
        }
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse, CaseforgeError> {
            Err(CaseforgeError::Config("chat not stubbed".into()))
        }
        async fn embed(
            &self,
            _model: &str,
            texts: &[&str],
        ) -> Result<Vec<Vec<f32>>, CaseforgeError> {
            Ok(texts.iter().map(|t| stub_vector(t)).collect())
        }
    }

    async fn retriever() -> Retriever {
        let entries = vec![
            CorpusEntry {
                text: "login use case".into(),
                kind: EntryKind::UseCase,
            },
            CorpusEntry {
                text: "payment use case".into(),
                kind: EntryKind::UseCase,
            },
        ];
        let index = EmbeddingIndex::build(entries, &EmbedStub, "stub-model", 100)
            .await
            .unwrap();
        Retriever::new(index, Arc::new(EmbedStub), "stub-model")
    }

    #[tokio::test]
    async fn test_retrieve_nearest_first() {
        let r = retriever().await;
        let results = r.retrieve_similar("something about login", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "login use case");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_clamps_top_k() {
        let r = retriever().await;
        let results = r.retrieve_similar("anything", 50).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_exact_match_scores_one() {
        let r = retriever().await;
        let results = r.retrieve_similar("login use case", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }
}
