// src/core/telemetry.rs — Per-call usage statistics

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::TokenUsage;

/// Appends one CSV row per generation call:
/// `model,prompt_tokens,completion_tokens,cost_usd,latency_seconds`.
///
/// No header row, so output from many runs concatenates cleanly. Writes are
/// best-effort; a failed append is logged and never fails the call that
/// produced the row.
pub struct Telemetry {
    path: PathBuf,
}

impl Telemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record(&self, model: &str, usage: &TokenUsage, cost_usd: f64, latency: Duration) {
        if let Err(e) = self.append_row(model, usage, cost_usd, latency) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append telemetry row");
        }
    }

    fn append_row(
        &self,
        model: &str,
        usage: &TokenUsage,
        cost_usd: f64,
        latency: Duration,
    ) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{},{},{},{:.6},{:.3}",
            model,
            usage.prompt_tokens,
            usage.completion_tokens,
            cost_usd,
            latency.as_secs_f64()
        )
    }
}
