//! kwgn-ingest: runs the `kwgn` extraction engine over uploaded statements,
//! falling back across statement types and isolating per-file failures.

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod runner;
pub mod scratch;

pub use engine::{DEFAULT_TIMEOUT, ExtractionEngine, KwgnCli};
pub use error::{EngineFault, IngestError};
pub use orchestrator::{BatchEnvelope, BatchRollup, FileRollup, Orchestrator};
pub use runner::{Attempt, AttemptOutcome, RunOutcome};
