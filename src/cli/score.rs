// src/cli/score.rs — Re-aggregate persisted scores

use std::path::PathBuf;

use crate::batch::EvalRecord;
use crate::corpus::records;
use crate::evaluator::{aggregate, SimilarityScore};
use crate::infra::config::Config;

/// Handle the `caseforge score` command. Reads an existing result store and
/// reports the mean scores without touching the model.
pub fn run_score(config: &Config, results: Option<String>) -> anyhow::Result<()> {
    let path = results
        .map(PathBuf::from)
        .unwrap_or_else(|| config.batch.results.clone());

    let records: Vec<EvalRecord> = records::read_records(&path)?;
    if records.is_empty() {
        anyhow::bail!("No results found at {}", path.display());
    }

    let scores: Vec<SimilarityScore> = records.iter().map(|r| r.bert_score).collect();
    let summary = aggregate(&scores)?;

    println!("{} scored record(s) in {}", records.len(), path.display());
    println!("{summary}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(p: f32, r: f32, f1: f32) -> EvalRecord {
        EvalRecord {
            usecase: json!({"name": "Login"}),
            testcases: json!([{"name": "valid login"}]),
            generated_testcases: json!([{"name": "valid login"}]),
            bert_score: SimilarityScore {
                precision: p,
                recall: r,
                f1,
            },
        }
    }

    // ─── run_score tests ────────────────────────────────────────

    #[test]
    fn test_reports_over_existing_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let lines = [
            serde_json::to_string(&record(0.8, 0.6, 0.686)).unwrap(),
            serde_json::to_string(&record(1.0, 1.0, 1.0)).unwrap(),
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();

        let config = Config::default();
        let got = run_score(&config, Some(path.to_string_lossy().into_owned()));
        assert!(got.is_ok());
    }

    #[test]
    fn test_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jsonl");

        let config = Config::default();
        let got = run_score(&config, Some(path.to_string_lossy().into_owned()));
        assert!(got.is_err());
    }
}
