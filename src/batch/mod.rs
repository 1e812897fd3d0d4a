// src/batch/mod.rs — Dataset-driven generation and scoring

pub mod watermark;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::cost::RunCost;
use crate::core::generator::Generator;
use crate::corpus::records;
use crate::evaluator::{self, ScoreSummary, Scorer, SimilarityScore};
use crate::infra::config::{BatchConfig, Config};
use crate::infra::errors::CaseforgeError;
use crate::provider::TokenUsage;
use watermark::Watermark;

/// One dataset line. Fields are optional at the serde level so a sparse line
/// loads fine and fails per-item instead of poisoning the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(default)]
    pub usecase: Option<Value>,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub testcases: Option<Value>,
}

/// One completed item: the input, its human-written reference, what the model
/// produced, and how closely they matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub usecase: Value,
    pub testcases: Value,
    pub generated_testcases: Value,
    pub bert_score: SimilarityScore,
}

/// Walks a dataset sequentially: generate, score, persist, one item at a
/// time. Finished indices live in a watermark sidecar, so interrupting and
/// rerunning picks up exactly the unfinished ones.
pub struct BatchRunner {
    generator: Generator,
    scorer: Arc<dyn Scorer>,
    model: String,
    batch: BatchConfig,
}

impl BatchRunner {
    pub fn new(generator: Generator, scorer: Arc<dyn Scorer>, config: &Config) -> Self {
        Self {
            generator,
            scorer,
            model: config.provider.model.clone(),
            batch: config.batch.clone(),
        }
    }

    /// Process the dataset and return aggregate scores over the whole result
    /// store. `fresh` archives any existing results and starts over; the
    /// default resumes.
    pub async fn run(
        &self,
        use_embedding: bool,
        fresh: bool,
    ) -> Result<ScoreSummary, CaseforgeError> {
        if !self.batch.dataset.exists() {
            return Err(CaseforgeError::Config(format!(
                "dataset not found: {}",
                self.batch.dataset.display()
            )));
        }

        let watermark_path = Watermark::path_for(&self.batch.results);

        if fresh {
            if let Some(backup) = records::archive_with_timestamp(&self.batch.results)? {
                tracing::info!(backup = %backup.display(), "archived previous results");
            }
            records::write_records::<EvalRecord>(&self.batch.results, &[])?;
            Watermark::default().save(&watermark_path)?;
        }

        let mut results: Vec<EvalRecord> = records::read_records(&self.batch.results)?;

        let mut watermark = if !watermark_path.exists() && !results.is_empty() {
            // Result stores predating the watermark were filled positionally,
            // so their first len() indices are the completed ones.
            let seeded = Watermark::seed_positional(results.len());
            seeded.save(&watermark_path)?;
            seeded
        } else {
            Watermark::load(&watermark_path)?
        };

        let mut dataset: Vec<DatasetRecord> = records::read_records(&self.batch.dataset)?;
        dataset.truncate(self.batch.limit);

        tracing::info!(
            items = dataset.len(),
            completed = watermark.len(),
            use_embedding,
            "starting batch"
        );

        let mut run_cost = RunCost::new();
        let mut generated = 0usize;
        let mut failed = 0usize;

        for (idx, record) in dataset.iter().enumerate() {
            if watermark.contains(idx) {
                tracing::debug!(idx, "already completed, skipping");
                continue;
            }

            match self.process_item(record, use_embedding).await {
                Ok((eval_record, usage)) => {
                    run_cost.record(&self.model, &usage);
                    results.push(eval_record);
                    // Store first, then watermark: a crash in between costs a
                    // duplicate on rerun, never a lost record.
                    records::write_records(&self.batch.results, &results)?;
                    watermark.insert(idx);
                    watermark.save(&watermark_path)?;
                    generated += 1;
                    tracing::info!(idx, total = dataset.len(), "item complete");
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(idx, error = %e, "item failed, left for the next run");
                }
            }
        }

        tracing::info!(
            generated,
            failed,
            records = results.len(),
            cost = %run_cost.summary(),
            "batch finished"
        );

        let scores: Vec<SimilarityScore> = results.iter().map(|r| r.bert_score).collect();
        evaluator::aggregate(&scores)
    }

    async fn process_item(
        &self,
        record: &DatasetRecord,
        use_embedding: bool,
    ) -> Result<(EvalRecord, TokenUsage), CaseforgeError> {
        let usecase = record
            .usecase
            .clone()
            .ok_or_else(|| CaseforgeError::Generation("dataset record has no usecase".into()))?;
        let usecase = strip_volatile(usecase);
        let project_description = record.project_description.as_deref().ok_or_else(|| {
            CaseforgeError::Generation("dataset record has no project_description".into())
        })?;
        let reference = record.testcases.clone().ok_or_else(|| {
            CaseforgeError::Generation("dataset record has no reference testcases".into())
        })?;

        let generation = self
            .generator
            .generate(&pretty(&usecase)?, project_description, use_embedding)
            .await?;
        let generated = generation.suite.to_value();

        let score = self.scorer.score(&pretty(&reference)?, &pretty(&generated)?)?;

        Ok((
            EvalRecord {
                usecase,
                testcases: reference,
                generated_testcases: generated,
                bert_score: score,
            },
            generation.usage,
        ))
    }
}

/// Dataset use cases may carry provenance fields; they would leak into the
/// prompt and the persisted record, so both are dropped.
fn strip_volatile(mut usecase: Value) -> Value {
    if let Some(obj) = usecase.as_object_mut() {
        obj.remove("author");
        obj.remove("id");
    }
    usecase
}

fn pretty(value: &Value) -> Result<String, CaseforgeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CaseforgeError::Generation(format!("failed to serialize JSON: {}", e)))
}
