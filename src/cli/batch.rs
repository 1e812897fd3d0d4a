// src/cli/batch.rs — Dataset evaluation run

use std::sync::Arc;

use crate::batch::BatchRunner;
use crate::core::generator::Generator;
use crate::core::telemetry::Telemetry;
use crate::evaluator::{Scorer, SemanticScorer};
use crate::index::retrieval::Retriever;
use crate::index::EmbeddingIndex;
use crate::infra::config::Config;
use crate::provider::ModelProvider;

/// Handle the `caseforge batch` command.
pub async fn run_batch(
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    use_embedding: bool,
    fresh: bool,
    dataset: Option<String>,
    results: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(path) = dataset {
        config.batch.dataset = path.into();
    }
    if let Some(path) = results {
        config.batch.results = path.into();
    }
    if let Some(n) = limit {
        config.batch.limit = n;
    }

    let mut generator = Generator::new(provider.clone(), &config)
        .with_telemetry(Telemetry::new(config.telemetry.path.clone()));
    if use_embedding {
        let index = EmbeddingIndex::load(&config.index_dir())?;
        generator = generator.with_retriever(Retriever::new(
            index,
            provider,
            config.provider.embedding_model.clone(),
        ));
    }

    let scorer: Arc<dyn Scorer> = Arc::new(SemanticScorer::new(&config.scorer)?);
    let runner = BatchRunner::new(generator, scorer, &config);
    let summary = runner.run(use_embedding, fresh).await?;

    println!("{summary}");
    Ok(())
}
