//! kwgn-finance: views derived from a session's transactions, CSV export,
//! daily cash flow, the categorical flow graph and per-file summaries

pub mod csv_export;
pub mod daily_flow;
pub mod file_summary;
pub mod flow_graph;

pub use csv_export::{CsvRow, rows_from_results, to_csv_rows, to_csv_string, write_csv};
pub use daily_flow::{CumulativeFlow, DailyFlow, cumulative_flow, daily_flow, parse_statement_date};
pub use file_summary::{FileStatus, FileSummary, SessionSummary, summarize_file, summarize_session};
pub use flow_graph::{FlowGraph, FlowLink, FlowNode, NodeKind, flow_graph};
