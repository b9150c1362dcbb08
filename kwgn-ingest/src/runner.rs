//! Try each statement type against one file until one yields transactions.
//!
//! Attempts run one at a time in the given order. A fault does not stop the
//! loop; it is remembered as the last error. A payload without transactions
//! is a non-match and the loop moves on.

use std::path::Path;
use tracing::{debug, warn};

use kwgn_core::{ExtractResult, ExtractionStrategy};

use crate::engine::ExtractionEngine;

pub const ERROR_NO_STRATEGY: &str = "No statement type matched";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Matched,
    NonMatch,
    Fault(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: ExtractionStrategy,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Matched {
        strategy: ExtractionStrategy,
        payload: ExtractResult,
        attempts: Vec<Attempt>,
    },
    Exhausted {
        error: String,
        attempts: Vec<Attempt>,
    },
}

impl RunOutcome {
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            RunOutcome::Matched { attempts, .. } | RunOutcome::Exhausted { attempts, .. } => {
                attempts
            }
        }
    }

    pub fn strategy(&self) -> Option<ExtractionStrategy> {
        match self {
            RunOutcome::Matched { strategy, .. } => Some(*strategy),
            RunOutcome::Exhausted { .. } => None,
        }
    }
}

pub async fn run<E: ExtractionEngine>(
    engine: &E,
    path: &Path,
    strategies: &[ExtractionStrategy],
) -> RunOutcome {
    let mut attempts = Vec::with_capacity(strategies.len());
    let mut last_error: Option<String> = None;

    for &strategy in strategies {
        match engine.extract(path, strategy).await {
            Ok(payload) if payload.is_match() => {
                debug!(%strategy, transactions = payload.transactions.len(), "matched");
                attempts.push(Attempt {
                    strategy,
                    outcome: AttemptOutcome::Matched,
                });
                return RunOutcome::Matched {
                    strategy,
                    payload,
                    attempts,
                };
            }
            Ok(_) => {
                debug!(%strategy, "no transactions, trying next type");
                attempts.push(Attempt {
                    strategy,
                    outcome: AttemptOutcome::NonMatch,
                });
            }
            Err(fault) => {
                warn!(%strategy, "extraction attempt failed: {fault}");
                let message = fault.to_string();
                attempts.push(Attempt {
                    strategy,
                    outcome: AttemptOutcome::Fault(message.clone()),
                });
                last_error = Some(message);
            }
        }
    }

    let error = match last_error {
        Some(e) => format!("KWGN extraction failed - {e}"),
        None if strategies.is_empty() => "No statement types configured".to_string(),
        None => {
            let tried: Vec<&str> = strategies.iter().map(|s| s.key()).collect();
            format!("{ERROR_NO_STRATEGY} (tried {})", tried.join(", "))
        }
    };

    RunOutcome::Exhausted { error, attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineFault;
    use kwgn_core::{Account, Transaction, TxnType};
    use std::time::Duration;

    use ExtractionStrategy::{Maybank2Cc as B, MaybankCasaAndMae as A, Tng as C};

    #[derive(Clone, Copy)]
    enum Reply {
        Match,
        Empty,
        Timeout,
    }

    /// Answers each strategy with a fixed reply; unlisted strategies return empty.
    struct FixedEngine(Vec<(ExtractionStrategy, Reply)>);

    fn payload(with_txn: bool) -> ExtractResult {
        ExtractResult {
            account: Account {
                account_number: "1".to_string(),
                account_name: "A".to_string(),
                account_type: "CASA".to_string(),
                debit_credit: "debit".to_string(),
                reconciliable: true,
            },
            nett: "5.00".to_string(),
            source: String::new(),
            total_credit: "5.00".to_string(),
            total_debit: "0.00".to_string(),
            transactions: if with_txn {
                vec![Transaction {
                    sequence: 1,
                    date: "2024-12-01".to_string(),
                    descriptions: vec!["SALARY".to_string()],
                    kind: TxnType::Credit,
                    amount: "5.00".to_string(),
                    balance: String::new(),
                    reference: String::new(),
                }]
            } else {
                Vec::new()
            },
        }
    }

    impl ExtractionEngine for FixedEngine {
        async fn extract(
            &self,
            _path: &Path,
            strategy: ExtractionStrategy,
        ) -> Result<ExtractResult, EngineFault> {
            let reply = self
                .0
                .iter()
                .find(|(s, _)| *s == strategy)
                .map(|(_, r)| *r)
                .unwrap_or(Reply::Empty);
            match reply {
                Reply::Match => Ok(payload(true)),
                Reply::Empty => Ok(payload(false)),
                Reply::Timeout => Err(EngineFault::Timeout(Duration::from_secs(2))),
            }
        }
    }

    fn outcomes(run: &RunOutcome) -> Vec<AttemptOutcome> {
        run.attempts().iter().map(|a| a.outcome.clone()).collect()
    }

    #[tokio::test]
    async fn test_empty_payload_falls_through_to_next_type() {
        let engine = FixedEngine(vec![(B, Reply::Match)]);
        let out = run(&engine, Path::new("s.pdf"), &[A, B, C]).await;

        assert_eq!(out.strategy(), Some(B));
        assert_eq!(
            outcomes(&out),
            vec![AttemptOutcome::NonMatch, AttemptOutcome::Matched]
        );
        let tried: Vec<_> = out.attempts().iter().map(|a| a.strategy).collect();
        assert_eq!(tried, vec![A, B]);
    }

    #[tokio::test]
    async fn test_all_faults_report_last_error() {
        let engine = FixedEngine(vec![
            (A, Reply::Timeout),
            (B, Reply::Timeout),
            (C, Reply::Timeout),
        ]);
        let out = run(&engine, Path::new("s.pdf"), &[A, B, C]).await;

        assert_eq!(out.strategy(), None);
        let fault = AttemptOutcome::Fault("no response within 2s".to_string());
        assert_eq!(outcomes(&out), vec![fault.clone(), fault.clone(), fault]);
        let RunOutcome::Exhausted { error, .. } = out else {
            panic!("expected exhaustion");
        };
        assert_eq!(error, "KWGN extraction failed - no response within 2s");
    }

    #[tokio::test]
    async fn test_fault_then_match() {
        let engine = FixedEngine(vec![(A, Reply::Timeout), (C, Reply::Match)]);
        let out = run(&engine, Path::new("s.pdf"), &[A, B, C]).await;

        assert_eq!(out.strategy(), Some(C));
        assert!(matches!(
            outcomes(&out).as_slice(),
            [AttemptOutcome::Fault(_), AttemptOutcome::NonMatch, AttemptOutcome::Matched]
        ));
    }

    #[tokio::test]
    async fn test_all_empty_lists_tried_types() {
        let engine = FixedEngine(Vec::new());
        let out = run(&engine, Path::new("s.pdf"), &ExtractionStrategy::ALL).await;

        assert_eq!(outcomes(&out), vec![AttemptOutcome::NonMatch; 3]);
        let RunOutcome::Exhausted { error, .. } = out else {
            panic!("expected exhaustion");
        };
        assert_eq!(
            error,
            "No statement type matched (tried MAYBANK_CASA_AND_MAE, MAYBANK_2_CC, TNG)"
        );
    }

    #[tokio::test]
    async fn test_no_types_configured() {
        let out = run(&FixedEngine(Vec::new()), Path::new("s.pdf"), &[]).await;
        assert!(out.attempts().is_empty());
        let RunOutcome::Exhausted { error, .. } = out else {
            panic!("expected exhaustion");
        };
        assert_eq!(error, "No statement types configured");
    }
}
