// src/cli/index.rs — Embedding index maintenance

use std::path::Path;
use std::sync::Arc;

use super::IndexAction;
use crate::corpus;
use crate::index::retrieval::Retriever;
use crate::index::EmbeddingIndex;
use crate::infra::config::Config;
use crate::provider::ModelProvider;

/// Handle the `caseforge index` command.
pub async fn run_index(
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    action: IndexAction,
) -> anyhow::Result<()> {
    match action {
        IndexAction::Build { corpus } => build_index(provider, config, Path::new(&corpus)).await,
        IndexAction::Query { query, top_k } => query_index(provider, config, &query, top_k).await,
    }
}

async fn build_index(
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    corpus_dir: &Path,
) -> anyhow::Result<()> {
    let entries = corpus::load_corpus(corpus_dir)?;
    if entries.is_empty() {
        anyhow::bail!("No corpus records found under {}", corpus_dir.display());
    }

    let index = EmbeddingIndex::build(
        entries,
        provider.as_ref(),
        &config.provider.embedding_model,
        config.retrieval.embed_batch_size,
    )
    .await?;

    let dir = config.index_dir();
    index.save(&dir)?;
    println!("Indexed {} entries into {}", index.len(), dir.display());
    Ok(())
}

async fn query_index(
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    query: &str,
    top_k: usize,
) -> anyhow::Result<()> {
    let index = EmbeddingIndex::load(&config.index_dir())?;
    let retriever = Retriever::new(index, provider, config.provider.embedding_model.clone());

    let hits = retriever.retrieve_similar(query, top_k).await?;
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. [{:.4}] ({}) {}",
            rank + 1,
            hit.score,
            hit.kind,
            preview(&hit.text),
        );
    }
    Ok(())
}

/// First line of the entry, clipped for terminal display.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    let mut out: String = line.chars().take(100).collect();
    if line.chars().count() > 100 {
        out.push_str("...");
    }
    out
}
