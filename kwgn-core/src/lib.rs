//! kwgn-core: statement types, content digests, the text log codec and the
//! session aggregation reducer shared by the kwgn batch pipeline.

pub mod amount;
pub mod digest;
pub mod log_format;
pub mod result;
pub mod session;
pub mod statement;
pub mod strategy;
pub mod submission;

pub use amount::{FlowTotals, ReportedSums, ReportedTotals, parse_amount};
pub use digest::{Digest, ERROR_DUPLICATE_HASH, Screened, digest, is_duplicate, screen_batch};
pub use result::FileResult;
pub use session::{
    SessionAction, SessionFile, SessionState, SessionStore, SourcedTransaction, batch_actions,
    failure_actions, upsert,
};
pub use statement::{Account, ExtractResult, Transaction, TxnType};
pub use strategy::{ExtractionStrategy, ParseStrategyError};
pub use submission::{FileId, FileSubmission};
