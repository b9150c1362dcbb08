//! Decimal arithmetic over the engine's amount strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statement::{ExtractResult, Transaction, TxnType};

/// Parse an engine amount string ("1,234.50", "-49.75", "RM 10.00").
///
/// Everything except digits, `.` and `-` is dropped before parsing.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Credit, debit and net totals for a set of transactions.
///
/// Debits are summed by magnitude so the result does not depend on whether
/// a statement layout signs its debit amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub credit: Decimal,
    pub debit: Decimal,
    pub net: Decimal,
}

impl FlowTotals {
    pub fn from_transactions<'a>(txns: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = FlowTotals::default();
        for txn in txns {
            totals.add(txn);
        }
        totals
    }

    pub fn add(&mut self, txn: &Transaction) {
        let Some(amount) = parse_amount(&txn.amount) else {
            return;
        };
        match txn.kind {
            TxnType::Credit => self.credit += amount.abs(),
            TxnType::Debit => self.debit += amount.abs(),
        }
        self.net = self.credit - self.debit;
    }

    pub fn merge(&mut self, other: &FlowTotals) {
        self.credit += other.credit;
        self.debit += other.debit;
        self.net = self.credit - self.debit;
    }
}

/// Statement totals exactly as the engine reported them. Not re-validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedTotals {
    pub total_credit: String,
    pub total_debit: String,
    pub nett: String,
}

impl ReportedTotals {
    pub fn from_payload(payload: &ExtractResult) -> Self {
        Self {
            total_credit: payload.total_credit.clone(),
            total_debit: payload.total_debit.clone(),
            nett: payload.nett.clone(),
        }
    }
}

/// Reported totals summed across statements, signs kept as written.
/// Fields that don't parse add nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedSums {
    pub credit: Decimal,
    pub debit: Decimal,
    pub nett: Decimal,
}

impl ReportedSums {
    pub fn add(&mut self, reported: &ReportedTotals) {
        self.credit += parse_amount(&reported.total_credit).unwrap_or_default();
        self.debit += parse_amount(&reported.total_debit).unwrap_or_default();
        self.nett += parse_amount(&reported.nett).unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn txn(kind: TxnType, amount: &str) -> Transaction {
        Transaction {
            sequence: 1,
            date: "2024-12-01".to_string(),
            descriptions: vec![],
            kind,
            amount: amount.to_string(),
            balance: "0.00".to_string(),
            reference: String::new(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_strips_formatting() {
        assert_eq!(parse_amount("1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_amount("-49.75"), Some(dec("-49.75")));
        assert_eq!(parse_amount("RM 10.00"), Some(dec("10.00")));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_totals_ignore_debit_sign_convention() {
        let signed = FlowTotals::from_transactions(&[
            txn(TxnType::Credit, "3500.00"),
            txn(TxnType::Debit, "-49.75"),
        ]);
        let unsigned = FlowTotals::from_transactions(&[
            txn(TxnType::Credit, "3500.00"),
            txn(TxnType::Debit, "49.75"),
        ]);
        assert_eq!(signed, unsigned);
        assert_eq!(signed.credit, dec("3500.00"));
        assert_eq!(signed.debit, dec("49.75"));
        assert_eq!(signed.net, dec("3450.25"));
    }

    #[test]
    fn test_unparseable_amounts_are_skipped() {
        let totals = FlowTotals::from_transactions(&[
            txn(TxnType::Credit, "--"),
            txn(TxnType::Credit, "10.10"),
        ]);
        assert_eq!(totals.credit, dec("10.10"));
    }

    #[test]
    fn test_merge() {
        let mut a = FlowTotals::from_transactions(&[txn(TxnType::Credit, "5")]);
        let b = FlowTotals::from_transactions(&[txn(TxnType::Debit, "2")]);
        a.merge(&b);
        assert_eq!(a.net, dec("3"));
    }

    #[test]
    fn test_reported_sums_keep_engine_values() {
        let a = ReportedTotals {
            total_credit: "3,500.00".to_string(),
            total_debit: "-49.75".to_string(),
            nett: "3450.25".to_string(),
        };
        let b = ReportedTotals {
            total_credit: "10.00".to_string(),
            total_debit: "".to_string(),
            nett: "RM 10.00".to_string(),
        };
        let mut sums = ReportedSums::default();
        sums.add(&a);
        sums.add(&b);
        assert_eq!(sums.credit, dec("3510.00"));
        assert_eq!(sums.debit, dec("-49.75"));
        assert_eq!(sums.nett, dec("3460.25"));
    }
}
