// src/main.rs — Caseforge entry point

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use caseforge::cli::{Cli, Commands};
use caseforge::infra::config::Config;
use caseforge::infra::errors::CaseforgeError;
use caseforge::infra::logger;
use caseforge::provider::openai::OpenAIProvider;
use caseforge::provider::retry::{RetryConfig, RetryProvider};
use caseforge::provider::ModelProvider;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    // Dispatch subcommands that don't need a provider
    match &cli.command {
        Commands::Score { results } => {
            return caseforge::cli::score::run_score(&config, results.clone());
        }
        Commands::Export {
            input,
            format,
            output,
        } => {
            return caseforge::cli::export::run_export(input, format, output.as_deref());
        }
        _ => {}
    }

    let provider = build_provider(cli.api_key.as_deref(), &config)?;

    match cli.command {
        Commands::Generate {
            usecase,
            usecase_file,
            project_description,
            project_file,
            use_embedding,
            output,
            csv,
        } => {
            caseforge::cli::generate::run_generate(
                provider,
                &config,
                usecase,
                usecase_file,
                project_description,
                project_file,
                use_embedding,
                output,
                csv,
            )
            .await
        }
        Commands::Batch {
            use_embedding,
            fresh,
            dataset,
            results,
            limit,
        } => {
            caseforge::cli::batch::run_batch(
                provider,
                &config,
                use_embedding,
                fresh,
                dataset,
                results,
                limit,
            )
            .await
        }
        Commands::Index { action } => {
            caseforge::cli::index::run_index(provider, &config, action).await
        }
        Commands::Score { .. } | Commands::Export { .. } => unreachable!(),
    }
}

/// Build the retry-wrapped model client. The key comes from `--api-key` or
/// the OPENAI_API_KEY environment variable.
fn build_provider(api_key: Option<&str>, config: &Config) -> anyhow::Result<Arc<dyn ModelProvider>> {
    let key = match api_key {
        Some(key) => key.to_string(),
        None => std::env::var("OPENAI_API_KEY").map_err(|_| {
            CaseforgeError::Config("no API key: set OPENAI_API_KEY or pass --api-key".into())
        })?,
    };

    let inner: Arc<dyn ModelProvider> = Arc::new(OpenAIProvider::with_base_url(
        key,
        config.provider.base_url.clone(),
        Duration::from_secs(config.provider.request_timeout_secs),
    ));
    Ok(Arc::new(RetryProvider::with_config(
        inner,
        RetryConfig::from(&config.retry),
    )))
}
