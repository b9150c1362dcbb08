//! Session-scoped aggregation of batch results.
//!
//! [`SessionState`] is never mutated in place: [`SessionState::reduce`] takes
//! a snapshot and an action and returns the next snapshot. [`SessionStore`]
//! only swaps the current snapshot.
//!
//! Files are keyed by their session-local [`FileId`], not by digest. Re-sending
//! files with ids already in the session replaces those entries and moves them
//! to the end of the list; nothing is ever deleted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::digest::Digest;
use crate::log_format;
use crate::result::FileResult;
use crate::statement::{Account, Transaction};
use crate::strategy::ExtractionStrategy;
use crate::submission::{FileId, FileSubmission};

/// Message recorded on every file of a batch that failed as a whole
pub const ERROR_PROCESSING_FAILED: &str = "Processing failed";

/// A file row as the session tracks it (bytes are not retained)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub media_type: String,
    pub last_modified: i64,
    pub processed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<ExtractionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
}

impl SessionFile {
    /// Pending row for a file about to be processed
    pub fn pending(id: FileId, submission: &FileSubmission) -> Self {
        Self {
            id,
            name: submission.name.clone(),
            size: submission.size,
            media_type: submission.media_type.clone(),
            last_modified: submission.last_modified,
            processed: false,
            output: None,
            error: None,
            strategy_used: None,
            digest: None,
        }
    }

    fn with_result(&self, result: &FileResult) -> Self {
        Self {
            processed: true,
            output: Some(result.output.clone()),
            error: result.error.clone(),
            strategy_used: result.strategy_used,
            digest: result.digest.clone(),
            ..self.clone()
        }
    }

    fn with_error(&self, message: &str) -> Self {
        Self {
            processed: true,
            error: Some(message.to_string()),
            ..self.clone()
        }
    }
}

/// A transaction tagged with the file it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedTransaction {
    pub file_id: FileId,
    /// Originating file name
    pub source: String,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub files: Vec<SessionFile>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<SourcedTransaction>,
    pub hashes: Vec<Digest>,
    /// Concatenated log blocks of every processed batch
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    ReplaceFiles(Vec<SessionFile>),
    UpsertFiles(Vec<SessionFile>),
    AppendAccounts(Vec<Account>),
    AppendTransactions(Vec<SourcedTransaction>),
    AppendHashes(Vec<Digest>),
    AppendOutput(String),
}

/// Drop every entry of `existing` whose id is in `updates`, then append `updates`.
pub fn upsert(existing: &[SessionFile], updates: Vec<SessionFile>) -> Vec<SessionFile> {
    let replaced: HashSet<FileId> = updates.iter().map(|f| f.id.clone()).collect();
    let mut files: Vec<SessionFile> = existing
        .iter()
        .filter(|f| !replaced.contains(&f.id))
        .cloned()
        .collect();
    files.extend(updates);
    files
}

impl SessionState {
    pub fn reduce(&self, action: SessionAction) -> SessionState {
        let mut next = self.clone();
        match action {
            SessionAction::ReplaceFiles(files) => next.files = files,
            SessionAction::UpsertFiles(files) => next.files = upsert(&self.files, files),
            SessionAction::AppendAccounts(accounts) => next.accounts.extend(accounts),
            SessionAction::AppendTransactions(txns) => next.transactions.extend(txns),
            SessionAction::AppendHashes(hashes) => next.hashes.extend(hashes),
            SessionAction::AppendOutput(text) => {
                next.output = log_format::append_log(&self.output, &text)
            }
        }
        next
    }

    /// Digests already extracted in this session
    pub fn known_digests(&self) -> HashSet<Digest> {
        self.hashes.iter().cloned().collect()
    }

    pub fn file(&self, id: &FileId) -> Option<&SessionFile> {
        self.files.iter().find(|f| &f.id == id)
    }
}

/// Actions folding a successful batch into the session.
///
/// `files` and `results` are index-aligned (the orchestrator preserves order).
pub fn batch_actions(files: &[SessionFile], results: &[FileResult]) -> Vec<SessionAction> {
    let updated: Vec<SessionFile> = files
        .iter()
        .zip(results)
        .map(|(file, result)| file.with_result(result))
        .collect();

    let mut accounts = Vec::new();
    let mut transactions = Vec::new();
    let mut hashes = Vec::new();
    for (file, result) in files.iter().zip(results) {
        let Some(payload) = result.payload.as_ref().filter(|_| result.is_success()) else {
            continue;
        };
        accounts.push(payload.account.clone());
        transactions.extend(payload.transactions.iter().map(|txn| SourcedTransaction {
            file_id: file.id.clone(),
            source: file.name.clone(),
            transaction: txn.clone(),
        }));
        hashes.extend(result.digest.clone());
    }

    let output = log_format::join_blocks(results.iter().map(|r| r.output.as_str()));

    vec![
        SessionAction::UpsertFiles(updated),
        SessionAction::AppendOutput(output),
        SessionAction::AppendAccounts(accounts),
        SessionAction::AppendTransactions(transactions),
        SessionAction::AppendHashes(hashes),
    ]
}

/// Actions marking every file of a rejected batch with `error`.
pub fn failure_actions(files: &[SessionFile], error: &str) -> Vec<SessionAction> {
    let message = if error.trim().is_empty() {
        ERROR_PROCESSING_FAILED
    } else {
        error
    };
    vec![SessionAction::UpsertFiles(
        files.iter().map(|f| f.with_error(message)).collect(),
    )]
}

/// Holder of the current session snapshot
#[derive(Debug, Default)]
pub struct SessionStore {
    state: SessionState,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, action: SessionAction) {
        self.state = self.state.reduce(action);
    }

    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = SessionAction>) {
        for action in actions {
            self.dispatch(action);
        }
        debug!(
            files = self.state.files.len(),
            transactions = self.state.transactions.len(),
            "session updated"
        );
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }
}
