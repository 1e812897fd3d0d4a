// src/batch/watermark.rs — Completed-index tracking for resumable runs

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::infra::errors::CaseforgeError;

/// The set of dataset indices that made it all the way to disk.
///
/// Kept in a sidecar file next to the result store so a rerun can skip
/// finished work and retry only the gaps. Archiving the result store never
/// touches the watermark; clearing it is an explicit operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    completed: BTreeSet<usize>,
}

impl Watermark {
    /// Sidecar path for a given result store,
    /// e.g. `results/run.jsonl` → `results/run.watermark.json`.
    pub fn path_for(results: &Path) -> PathBuf {
        results.with_extension("watermark.json")
    }

    /// Result files predating the watermark were skipped by position;
    /// seeding `0..n` reproduces that for existing stores.
    pub fn seed_positional(n: usize) -> Self {
        Self {
            completed: (0..n).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CaseforgeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            CaseforgeError::Persistence(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            CaseforgeError::Persistence(format!("corrupt watermark {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), CaseforgeError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            CaseforgeError::Persistence(format!("failed to serialize watermark: {}", e))
        })?;
        fs::write(path, content).map_err(|e| {
            CaseforgeError::Persistence(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.completed.contains(&idx)
    }

    pub fn insert(&mut self, idx: usize) {
        self.completed.insert(idx);
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}
