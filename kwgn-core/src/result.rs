//! Terminal outcome of processing one file.

use serde::{Deserialize, Serialize};

use crate::amount::{FlowTotals, ReportedTotals};
use crate::digest::Digest;
use crate::log_format;
use crate::statement::ExtractResult;
use crate::strategy::ExtractionStrategy;

/// One file's outcome. Exactly one of `payload` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub name: String,
    /// Absent when the result was recovered from a text log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    pub strategy_used: Option<ExtractionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ExtractResult>,
    /// This result rendered as a log block
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    /// Successful extraction. A payload without transactions is recorded as a
    /// failure instead.
    pub fn matched(
        name: impl Into<String>,
        digest: Option<Digest>,
        strategy: Option<ExtractionStrategy>,
        payload: ExtractResult,
    ) -> Self {
        if !payload.is_match() {
            return Self::failed(name, digest, log_format::ERROR_NO_TRANSACTIONS);
        }
        let mut result = Self {
            name: name.into(),
            digest,
            strategy_used: strategy,
            payload: Some(payload),
            output: String::new(),
            error: None,
        };
        result.output = log_format::encode(&result);
        result
    }

    pub fn failed(name: impl Into<String>, digest: Option<Digest>, error: impl Into<String>) -> Self {
        let mut result = Self {
            name: name.into(),
            digest,
            strategy_used: None,
            payload: None,
            output: String::new(),
            error: Some(error.into()),
        };
        result.output = log_format::encode(&result);
        result
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.payload.is_some()
    }

    pub fn transaction_count(&self) -> usize {
        self.payload.as_ref().map_or(0, |p| p.transactions.len())
    }

    /// Engine-reported statement totals of a successful extraction
    pub fn reported(&self) -> Option<ReportedTotals> {
        self.payload
            .as_ref()
            .filter(|_| self.is_success())
            .map(ReportedTotals::from_payload)
    }

    pub fn totals(&self) -> FlowTotals {
        self.payload
            .as_ref()
            .map(|p| FlowTotals::from_transactions(&p.transactions))
            .unwrap_or_default()
    }
}
