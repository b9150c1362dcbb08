//! Text log format for extraction results.
//!
//! Every processed file becomes one block:
//!
//! ```text
//! File: statement.pdf
//! KWGN Extract Output (Type: MAYBANK_CASA_AND_MAE):
//! { ...pretty-printed payload... }
//! ---
//! ```
//!
//! or, when extraction failed:
//!
//! ```text
//! File: statement.pdf
//! Error: KWGN extraction failed - exit status 1
//! ---
//! ```
//!
//! A session log is the blocks joined with a blank line. [`decode`] recovers
//! the structured results from that text alone, skipping blocks it cannot read.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

use crate::result::FileResult;
use crate::statement::ExtractResult;
use crate::strategy::ExtractionStrategy;

pub const DELIMITER: &str = "---";
const FILE_PREFIX: &str = "File: ";
const ERROR_PREFIX: &str = "Error: ";
const NULL_STRATEGY: &str = "null";

/// Message for a payload that came back without transactions
pub const ERROR_NO_TRANSACTIONS: &str = "No transactions found in extracted output";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^KWGN Extract Output(?:\s*\(Type:\s*(?P<ty>[^)]*)\))?:\s*$").expect("valid header regex")
});

/// Render one result as a log block (delimiter included, no trailing newline).
pub fn encode(result: &FileResult) -> String {
    let name = single_line(&result.name);
    match (&result.error, &result.payload) {
        (None, Some(payload)) => {
            let ty = result
                .strategy_used
                .map(|s| s.key())
                .unwrap_or(NULL_STRATEGY);
            let json = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
                warn!(file = %name, "payload did not serialize: {e}");
                "null".to_string()
            });
            format!("{FILE_PREFIX}{name}\nKWGN Extract Output (Type: {ty}):\n{json}\n{DELIMITER}")
        }
        (Some(error), _) => {
            format!("{FILE_PREFIX}{name}\n{ERROR_PREFIX}{}\n{DELIMITER}", single_line(error))
        }
        (None, None) => {
            format!("{FILE_PREFIX}{name}\n{ERROR_PREFIX}{ERROR_NO_TRANSACTIONS}\n{DELIMITER}")
        }
    }
}

/// Join rendered blocks the way a session log stores them.
pub fn join_blocks<'a>(blocks: impl IntoIterator<Item = &'a str>) -> String {
    blocks.into_iter().collect::<Vec<_>>().join("\n\n")
}

/// Append `next` to an existing log, separated by a blank line.
pub fn append_log(log: &str, next: &str) -> String {
    match (log.is_empty(), next.is_empty()) {
        (true, _) => next.to_string(),
        (_, true) => log.to_string(),
        _ => format!("{log}\n\n{next}"),
    }
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block does not start with a `File:` line")]
    MissingFileLine,
    #[error("block for {0} has no output or error line")]
    MissingBody(String),
    #[error("block for {name} has an unrecognised header: {line}")]
    UnknownHeader { name: String, line: String },
    #[error("block for {name} has an unreadable payload: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Recover results from a log. Unreadable blocks are logged and skipped.
pub fn decode(text: &str) -> Vec<FileResult> {
    split_blocks(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, lines)| match parse_block(&lines) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(block = i, "skipping log block: {e}");
                None
            }
        })
        .collect()
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim() == DELIMITER {
            blocks.push(std::mem::take(&mut current));
        } else {
            current.push(line);
        }
    }
    blocks.push(current);

    blocks
        .into_iter()
        .filter(|lines| lines.iter().any(|l| !l.trim().is_empty()))
        .collect()
}

/// Parse one block (delimiter already removed).
pub fn parse_block(lines: &[&str]) -> Result<FileResult, BlockError> {
    let mut rest = lines.iter().skip_while(|l| l.trim().is_empty());

    // names and messages are kept exactly as written after the `Key: ` prefix
    let name = rest
        .next()
        .and_then(|l| after_prefix(l, FILE_PREFIX))
        .map(str::to_string)
        .ok_or(BlockError::MissingFileLine)?;

    let line = rest
        .next()
        .ok_or_else(|| BlockError::MissingBody(name.clone()))?;

    if let Some(message) = after_prefix(line, ERROR_PREFIX) {
        return Ok(FileResult::failed(name, None, message));
    }
    let header = line.trim();

    let caps = HEADER_RE.captures(header).ok_or_else(|| BlockError::UnknownHeader {
        name: name.clone(),
        line: header.to_string(),
    })?;
    let strategy = caps
        .name("ty")
        .map(|m| m.as_str().trim())
        .filter(|ty| !ty.is_empty() && *ty != NULL_STRATEGY)
        .and_then(|ty| match ty.parse::<ExtractionStrategy>() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(file = %name, "{e}; keeping payload without a type");
                None
            }
        });

    let body = rest.copied().collect::<Vec<_>>().join("\n");
    let payload: ExtractResult = serde_json::from_str(&body).map_err(|source| BlockError::Payload {
        name: name.clone(),
        source,
    })?;

    Ok(FileResult::matched(name, None, strategy, payload))
}

/// Text after `prefix` (`"File: "`); the separating space is optional.
fn after_prefix<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let key = prefix.trim_end();
    let rest = line.trim_start().strip_prefix(key)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn single_line(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
