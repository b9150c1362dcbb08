//! Per-file status and totals for a session, recovered from each file's stored log text.

use serde::Serialize;

use kwgn_core::log_format;
use kwgn_core::{
    ExtractionStrategy, FileId, FlowTotals, ReportedSums, ReportedTotals, SessionFile, SessionState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processed,
    Error,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub status: FileStatus,
    pub strategy_used: Option<ExtractionStrategy>,
    pub transaction_count: usize,
    /// Recomputed from the decoded transactions
    pub totals: FlowTotals,
    /// Statement totals as the engine printed them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported: Option<ReportedTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub files: Vec<FileSummary>,
    pub transaction_count: usize,
    pub totals: FlowTotals,
    /// Engine-reported totals summed over processed files
    pub reported: ReportedSums,
}

pub fn summarize_file(file: &SessionFile) -> FileSummary {
    let status = match (file.processed, &file.error) {
        (false, _) => FileStatus::Pending,
        (true, Some(_)) => FileStatus::Error,
        (true, None) => FileStatus::Processed,
    };

    let decoded = file
        .output
        .as_deref()
        .map(log_format::decode)
        .unwrap_or_default();
    let mut totals = FlowTotals::default();
    let mut transaction_count = 0;
    for result in &decoded {
        totals.merge(&result.totals());
        transaction_count += result.transaction_count();
    }
    let reported = decoded.iter().find_map(|r| r.reported());

    FileSummary {
        id: file.id.clone(),
        name: file.name.clone(),
        status,
        strategy_used: file.strategy_used,
        transaction_count,
        totals,
        reported,
        error: file.error.clone(),
    }
}

pub fn summarize_session(state: &SessionState) -> SessionSummary {
    let files: Vec<FileSummary> = state.files.iter().map(summarize_file).collect();
    let mut totals = FlowTotals::default();
    let mut reported = ReportedSums::default();
    for f in &files {
        totals.merge(&f.totals);
        if let Some(r) = &f.reported {
            reported.add(r);
        }
    }
    SessionSummary {
        transaction_count: files.iter().map(|f| f.transaction_count).sum(),
        totals,
        reported,
        files,
    }
}
