//! Batch processing: screen, stage, extract, render.
//!
//! Files are processed strictly one after another, and each file's strategy
//! attempts are awaited in turn, so at most one engine process runs at a time.
//! Batch latency is the sum of every attempt across every file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

use kwgn_core::{
    Digest, ERROR_DUPLICATE_HASH, ExtractionStrategy, FileResult, FileSubmission, FlowTotals,
    ReportedSums, ReportedTotals, Screened, screen_batch,
};

use crate::engine::ExtractionEngine;
use crate::error::IngestError;
use crate::runner::{self, RunOutcome};
use crate::scratch::ScratchFile;

/// Per-file line of a batch rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRollup {
    pub name: String,
    pub strategy_used: Option<ExtractionStrategy>,
    pub transaction_count: usize,
    /// Recomputed from the transactions
    pub totals: FlowTotals,
    /// As the engine reported them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<ReportedTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counts and totals over one batch's results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRollup {
    pub file_count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub transaction_count: usize,
    pub totals: FlowTotals,
    pub reported: ReportedSums,
    pub files: Vec<FileRollup>,
}

impl BatchRollup {
    pub fn from_results(results: &[FileResult]) -> Self {
        let mut rollup = BatchRollup {
            file_count: results.len(),
            ..Default::default()
        };
        for result in results {
            let totals = result.totals();
            if result.is_success() {
                rollup.succeeded += 1;
            } else {
                rollup.failed += 1;
            }
            if result.error.as_deref() == Some(ERROR_DUPLICATE_HASH) {
                rollup.duplicates += 1;
            }
            rollup.transaction_count += result.transaction_count();
            rollup.totals.merge(&totals);
            let reported = result.reported();
            if let Some(r) = &reported {
                rollup.reported.add(r);
            }
            rollup.files.push(FileRollup {
                name: result.name.clone(),
                strategy_used: result.strategy_used,
                transaction_count: result.transaction_count(),
                totals,
                reported,
                error: result.error.clone(),
            });
        }
        rollup
    }
}

/// What the batch boundary hands back. Never an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchEnvelope {
    Success {
        results: Vec<FileResult>,
        rollups: BatchRollup,
    },
    Failure {
        error: String,
    },
}

pub struct Orchestrator<E> {
    engine: E,
    strategies: Vec<ExtractionStrategy>,
    scratch_dir: Option<PathBuf>,
}

impl<E: ExtractionEngine> Orchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            strategies: ExtractionStrategy::ALL.to_vec(),
            scratch_dir: None,
        }
    }

    /// Replace the fallback order. Order is kept exactly as given.
    pub fn with_strategies(mut self, strategies: Vec<ExtractionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.strategies
    }

    /// Process a batch. `results[i]` always belongs to `files[i]`.
    ///
    /// Files whose content is in `known` (or repeats an earlier file of the
    /// batch) are rejected without touching the engine.
    pub async fn process_batch(
        &self,
        files: &[FileSubmission],
        known: &HashSet<Digest>,
    ) -> Result<Vec<FileResult>, IngestError> {
        if files.is_empty() {
            return Err(IngestError::NoFiles);
        }

        info!(files = files.len(), "processing batch");
        let verdicts = screen_batch(files, known);

        let mut results = Vec::with_capacity(files.len());
        for (file, verdict) in files.iter().zip(verdicts) {
            let result = match verdict {
                Screened::Duplicate(digest) => {
                    warn!(file = %file.name, digest = digest.short(), "duplicate content, not processed");
                    FileResult::failed(&file.name, Some(digest), ERROR_DUPLICATE_HASH)
                }
                Screened::Fresh(digest) => self.process_file(file, digest).await,
            };
            results.push(result);
        }

        info!(
            succeeded = results.iter().filter(|r| r.is_success()).count(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            "batch complete"
        );
        Ok(results)
    }

    /// Writes the upload to a scratch file off the async worker threads.
    async fn stage(&self, file: &FileSubmission) -> std::io::Result<ScratchFile> {
        let dir = self.scratch_dir.clone();
        let name = file.name.clone();
        let bytes = file.bytes.clone();
        tokio::task::spawn_blocking(move || ScratchFile::create(dir.as_deref(), &name, &bytes))
            .await
            .map_err(std::io::Error::other)?
    }

    async fn process_file(&self, file: &FileSubmission, digest: Digest) -> FileResult {
        let scratch = match self.stage(file).await {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!(file = %file.name, "could not stage file: {e}");
                return FileResult::failed(
                    &file.name,
                    Some(digest),
                    format!("Failed to process file - {e}"),
                );
            }
        };

        let outcome = runner::run(&self.engine, scratch.path(), &self.strategies).await;
        if let Err(e) = tokio::task::spawn_blocking(move || drop(scratch)).await {
            warn!(file = %file.name, "scratch cleanup task failed: {e}");
        }

        match outcome {
            RunOutcome::Matched {
                strategy, payload, ..
            } => {
                info!(
                    file = %file.name,
                    %strategy,
                    transactions = payload.transactions.len(),
                    "extracted"
                );
                FileResult::matched(&file.name, Some(digest), Some(strategy), payload)
            }
            RunOutcome::Exhausted { error, attempts } => {
                warn!(file = %file.name, attempts = attempts.len(), "{error}");
                FileResult::failed(&file.name, Some(digest), error)
            }
        }
    }

    /// Batch boundary: converts every failure into an envelope.
    pub async fn submit(&self, files: &[FileSubmission], known: &HashSet<Digest>) -> BatchEnvelope {
        match self.process_batch(files, known).await {
            Ok(results) => {
                let rollups = BatchRollup::from_results(&results);
                BatchEnvelope::Success { results, rollups }
            }
            Err(e) => BatchEnvelope::Failure {
                error: e.to_string(),
            },
        }
    }
}
