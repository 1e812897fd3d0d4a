// src/corpus/mod.rs — Corpus extraction from JSONL datasets

pub mod records;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::CaseforgeError;

/// One indexable text with its origin kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    UseCase,
    TestCase,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::UseCase => write!(f, "usecase"),
            EntryKind::TestCase => write!(f, "testcase"),
        }
    }
}

/// Scan a directory of `*.jsonl` files and extract one entry per use case
/// and one per individual test case. Non-string values are flattened to
/// their JSON text. Malformed lines are skipped.
pub fn load_corpus(dir: &Path) -> Result<Vec<CorpusEntry>, CaseforgeError> {
    let pattern = dir.join("*.jsonl");
    let pattern = pattern.to_string_lossy();

    let mut entries = Vec::new();
    let mut files = 0usize;

    let paths = glob::glob(&pattern)
        .map_err(|e| CaseforgeError::Retrieval(format!("bad corpus pattern: {}", e)))?;

    for path in paths {
        let path = match path {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Skipping unreadable corpus path: {}", e);
                continue;
            }
        };
        files += 1;

        let content = std::fs::read_to_string(&path)?;
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let obj: serde_json::Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = lineno + 1,
                        "Skipped malformed line"
                    );
                    continue;
                }
            };

            if let Some(text) = value_as_text(&obj["usecase"]) {
                entries.push(CorpusEntry {
                    text,
                    kind: EntryKind::UseCase,
                });
            }

            if let Some(testcases) = obj["testcases"].as_array() {
                for tc in testcases {
                    if let Some(text) = value_as_text(tc) {
                        entries.push(CorpusEntry {
                            text,
                            kind: EntryKind::TestCase,
                        });
                    }
                }
            }
        }
    }

    let usecases = entries
        .iter()
        .filter(|e| e.kind == EntryKind::UseCase)
        .count();
    tracing::info!(
        files,
        total = entries.len(),
        usecases,
        testcases = entries.len() - usecases,
        "Loaded corpus"
    );

    Ok(entries)
}

/// Strings pass through; objects and other values become their JSON text.
/// Empty and null values yield nothing.
fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}
