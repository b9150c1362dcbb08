//! Statement payload types as emitted by the `kwgn extract` engine.
//!
//! Monetary fields are kept as the engine's decimal strings so they survive
//! a JSON round trip byte-for-byte. Arithmetic goes through [`crate::amount`].

use serde::{Deserialize, Serialize};

/// Account header of an extracted statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub account_name: String,
    pub account_type: String,
    pub debit_credit: String,
    pub reconciliable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Credit,
    Debit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Credit => "credit",
            TxnType::Debit => "debit",
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement line.
///
/// `sequence` is the position inside the source document, not a global id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sequence: u32,
    pub date: String,
    pub descriptions: Vec<String>,
    #[serde(rename = "type")]
    pub kind: TxnType,
    pub amount: String,
    pub balance: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

impl Transaction {
    /// First description line as written, used as the transaction's label
    pub fn primary_label(&self) -> Option<&str> {
        self.descriptions
            .first()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Structured payload returned by one successful engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub account: Account,
    #[serde(default)]
    pub nett: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub total_credit: String,
    #[serde(default)]
    pub total_debit: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl ExtractResult {
    /// A payload with no transactions does not count as a match.
    pub fn is_match(&self) -> bool {
        !self.transactions.is_empty()
    }
}
