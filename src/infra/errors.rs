// src/infra/errors.rs — Error types for Caseforge

use thiserror::Error;

use crate::core::parser::ParseError;

#[derive(Error, Debug)]
pub enum CaseforgeError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // Retrieval / index
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Index corrupt: {vectors} vectors but {entries} metadata entries")]
    IndexMismatch { vectors: usize, entries: usize },

    // Generation pipeline
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Generation failed: {0}")]
    Generation(String),

    // Scoring
    #[error("Scorer error: {0}")]
    Scorer(String),

    #[error("Cannot aggregate scores over an empty result set")]
    EmptyResultSet,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ort::Error> for CaseforgeError {
    fn from(e: ort::Error) -> Self {
        CaseforgeError::Scorer(e.to_string())
    }
}

impl CaseforgeError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            CaseforgeError::Provider {
                retriable: true,
                ..
            } | CaseforgeError::RateLimited { .. }
        )
    }
}
