use std::time::Duration;
use thiserror::Error;

/// Why one engine invocation produced no payload
#[derive(Debug, Error)]
pub enum EngineFault {
    #[error("could not start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("unreadable engine output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Batch-level precondition failures
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No files provided")]
    NoFiles,
}
