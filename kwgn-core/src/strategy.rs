//! Statement layouts understood by the extraction engine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A statement format passed to `kwgn extract --statement-type`.
///
/// Declaration order is the fallback priority (see [`ExtractionStrategy::ALL`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    #[serde(rename = "MAYBANK_CASA_AND_MAE")]
    MaybankCasaAndMae,
    #[serde(rename = "MAYBANK_2_CC")]
    Maybank2Cc,
    #[serde(rename = "TNG")]
    Tng,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 3] = [
        ExtractionStrategy::MaybankCasaAndMae,
        ExtractionStrategy::Maybank2Cc,
        ExtractionStrategy::Tng,
    ];

    /// Identifier the engine expects on its command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::MaybankCasaAndMae => "MAYBANK_CASA_AND_MAE",
            Self::Maybank2Cc => "MAYBANK_2_CC",
            Self::Tng => "TNG",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MaybankCasaAndMae => "Maybank CASA & MAE",
            Self::Maybank2Cc => "Maybank 2 Cards",
            Self::Tng => "Touch 'n Go eWallet",
        }
    }

    /// Parse a list of identifiers, keeping the given order and dropping repeats.
    pub fn parse_list<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Self>, ParseStrategyError> {
        let mut out: Vec<Self> = Vec::with_capacity(keys.len());
        for key in keys {
            let strategy: Self = key.as_ref().parse()?;
            if !out.contains(&strategy) {
                out.push(strategy);
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown statement type: {0}")]
pub struct ParseStrategyError(pub String);

impl FromStr for ExtractionStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}
