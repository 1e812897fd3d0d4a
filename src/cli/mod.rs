// src/cli/mod.rs — CLI definition (clap derive)

pub mod batch;
pub mod export;
pub mod generate;
pub mod index;
pub mod score;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caseforge", about = "Retrieval-augmented test case generation", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// API key for the model endpoint (falls back to OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate test cases for a single use case
    Generate {
        /// Use case text (reads stdin when no text or file is given)
        #[arg(long)]
        usecase: Option<String>,

        /// File holding the use case text
        #[arg(long)]
        usecase_file: Option<String>,

        /// Project description text
        #[arg(long)]
        project_description: Option<String>,

        /// File holding the project description
        #[arg(long)]
        project_file: Option<String>,

        /// Fill the prompt from the nearest indexed entries instead of the raw use case
        #[arg(long)]
        use_embedding: bool,

        /// Write the generated suite to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Also write the suite as a flattened CSV
        #[arg(long)]
        csv: Option<String>,
    },
    /// Generate and score every record in the evaluation dataset
    Batch {
        /// Fill each prompt from the nearest indexed entries instead of the raw use case
        #[arg(long)]
        use_embedding: bool,

        /// Archive existing results and start from the first record
        #[arg(long)]
        fresh: bool,

        /// Dataset path (overrides config)
        #[arg(long)]
        dataset: Option<String>,

        /// Result store path (overrides config)
        #[arg(long)]
        results: Option<String>,

        /// Cap on the number of dataset records (overrides config)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Build or query the embedding index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Re-aggregate the scores in an existing result store
    Score {
        /// Result store path (overrides config)
        #[arg(long)]
        results: Option<String>,
    },
    /// Convert a generated suite to another format
    Export {
        /// JSON file holding a generated suite
        input: String,

        /// Output format (csv, json, yaml)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum IndexAction {
    /// Embed every corpus record and persist the index
    Build {
        /// Directory of .jsonl corpus files
        #[arg(long)]
        corpus: String,
    },
    /// Look up the nearest entries for a query
    Query {
        /// Query text
        query: String,

        /// Number of entries to return
        #[arg(long, default_value = "5")]
        top_k: usize,
    },
}
