//! File output: shared artifact writer and the JSON run summary

use crate::error::{ReconError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Per-bucket counts for the run summary
#[derive(Serialize, Clone, Debug, Default)]
pub struct BucketSummary {
    pub domain: String,
    pub candidates: usize,
    pub resolved: usize,
    pub permutations: usize,
    pub resolved_permutations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Machine-readable account of one pipeline run
#[derive(Serialize, Clone, Debug, Default)]
pub struct RunSummary {
    pub program: String,
    pub date: String,
    pub target_domains: Vec<String>,
    pub working_domains: Vec<String>,
    pub generated: usize,
    pub candidates: usize,
    pub unclaimed: usize,
    pub buckets: Vec<BucketSummary>,
    pub final_count: usize,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn failed_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.error.is_some()).count()
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| ReconError::write(path, e))
    }
}

/// Artifact file shared between concurrent writers.
///
/// The lock is held for one write call only, so writers interleave whole blocks.
pub struct FileWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileWriter {
    /// Create (or truncate) the artifact at `path`
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .map_err(|e| ReconError::write(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Append a pre-formatted block of newline-terminated lines in one write
    pub async fn write_block(&self, block: &str) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock().await;
        file.write_all(block.as_bytes())
            .await
            .map_err(|e| ReconError::write(&self.path, e))
    }

    pub async fn finalize(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush()
            .await
            .map_err(|e| ReconError::write(&self.path, e))
    }
}
