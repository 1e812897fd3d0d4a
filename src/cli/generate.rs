// src/cli/generate.rs — Single use case generation

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::generator::Generator;
use crate::core::telemetry::Telemetry;
use crate::export;
use crate::index::retrieval::Retriever;
use crate::index::EmbeddingIndex;
use crate::infra::config::Config;
use crate::provider::ModelProvider;

/// Handle the `caseforge generate` command.
#[allow(clippy::too_many_arguments)]
pub async fn run_generate(
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    usecase: Option<String>,
    usecase_file: Option<String>,
    project_description: Option<String>,
    project_file: Option<String>,
    use_embedding: bool,
    output: Option<String>,
    csv: Option<String>,
) -> anyhow::Result<()> {
    let usecase = resolve_text(usecase, usecase_file.as_deref(), true)?.ok_or_else(|| {
        anyhow::anyhow!("No use case given. Pass --usecase, --usecase-file, or pipe text on stdin.")
    })?;
    let project_description =
        resolve_text(project_description, project_file.as_deref(), false)?.unwrap_or_default();

    let mut generator = Generator::new(provider.clone(), config)
        .with_telemetry(Telemetry::new(config.telemetry.path.clone()));
    if use_embedding {
        let index = EmbeddingIndex::load(&config.index_dir())?;
        generator = generator.with_retriever(Retriever::new(
            index,
            provider,
            config.provider.embedding_model.clone(),
        ));
    }

    let started = Instant::now();
    let generation = generator
        .generate(&usecase, &project_description, use_embedding)
        .await?;

    let rendered = serde_json::to_string_pretty(&generation.suite.to_value())?;
    match output.as_deref() {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("Wrote {} test case(s) to {}", generation.suite.len(), path);
        }
        None => println!("{rendered}"),
    }

    if let Some(path) = csv.as_deref() {
        export::write_csv(Path::new(path), &generation.suite)?;
        eprintln!("Wrote CSV to {path}");
    }

    eprintln!(
        "Generated in {:.2}s (${:.6}, {} prompt + {} completion tokens)",
        started.elapsed().as_secs_f64(),
        generation.cost_usd,
        generation.usage.prompt_tokens,
        generation.usage.completion_tokens,
    );
    Ok(())
}

/// Resolve input text from an inline flag, a file, or piped stdin.
fn resolve_text(
    inline: Option<String>,
    file: Option<&str>,
    allow_stdin: bool,
) -> anyhow::Result<Option<String>> {
    if let Some(text) = inline {
        return Ok(Some(text));
    }
    if let Some(path) = file {
        return Ok(Some(std::fs::read_to_string(path)?.trim().to_string()));
    }
    if allow_stdin {
        use std::io::{IsTerminal, Read};
        let mut stdin = std::io::stdin();
        if !stdin.is_terminal() {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf)?;
            let trimmed = buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }
    Ok(None)
}
