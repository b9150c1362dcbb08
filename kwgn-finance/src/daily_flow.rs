//! Money in / money out per statement date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use kwgn_core::{SourcedTransaction, TxnType, parse_amount};

/// Date layouts seen in statement exports, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y"];

pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// One day's bucket. `money_out` is zero or negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyFlow {
    pub date: String,
    pub parsed: Option<NaiveDate>,
    pub money_in: Decimal,
    pub money_out: Decimal,
}

impl DailyFlow {
    pub fn net(&self) -> Decimal {
        self.money_in + self.money_out
    }
}

/// A daily bucket plus the running net up to and including it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeFlow {
    pub date: String,
    pub net: Decimal,
    pub cumulative: Decimal,
}

fn chronological(a: &DailyFlow, b: &DailyFlow) -> Ordering {
    match (a.parsed, b.parsed) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.date.cmp(&b.date)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.date.cmp(&b.date),
    }
}

/// Group by the raw date string and sort chronologically.
///
/// Dates that parse come first in calendar order; the rest follow, sorted
/// lexically. Amounts that don't parse are skipped.
pub fn daily_flow(txns: &[SourcedTransaction]) -> Vec<DailyFlow> {
    let mut buckets: HashMap<&str, DailyFlow> = HashMap::new();

    for st in txns {
        let t = &st.transaction;
        let Some(amount) = parse_amount(&t.amount) else {
            continue;
        };
        let bucket = buckets.entry(t.date.as_str()).or_insert_with(|| DailyFlow {
            date: t.date.clone(),
            parsed: parse_statement_date(&t.date),
            money_in: Decimal::ZERO,
            money_out: Decimal::ZERO,
        });
        match t.kind {
            TxnType::Credit => bucket.money_in += amount,
            TxnType::Debit => bucket.money_out -= amount.abs(),
        }
    }

    let mut days: Vec<DailyFlow> = buckets.into_values().collect();
    days.sort_by(chronological);
    days
}

pub fn cumulative_flow(days: &[DailyFlow]) -> Vec<CumulativeFlow> {
    let mut running = Decimal::ZERO;
    days.iter()
        .map(|d| {
            running += d.net();
            CumulativeFlow {
                date: d.date.clone(),
                net: d.net(),
                cumulative: running,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwgn_core::{FileId, Transaction};
    use std::str::FromStr;

    fn st(date: &str, kind: TxnType, amount: &str) -> SourcedTransaction {
        SourcedTransaction {
            file_id: FileId::new(1, 0),
            source: "s.pdf".to_string(),
            transaction: Transaction {
                sequence: 1,
                date: date.to_string(),
                descriptions: vec![],
                kind,
                amount: amount.to_string(),
                balance: String::new(),
                reference: String::new(),
            },
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_groups_and_signs() {
        let days = daily_flow(&[
            st("2024-12-01", TxnType::Credit, "3500.00"),
            st("2024-12-01", TxnType::Debit, "-45.50"),
            st("2024-12-01", TxnType::Debit, "4.50"),
        ]);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].money_in, d("3500.00"));
        assert_eq!(days[0].money_out, d("-50.00"));
        assert_eq!(days[0].net(), d("3450.00"));
    }

    #[test]
    fn test_chronological_then_unparsable() {
        let days = daily_flow(&[
            st("zzz", TxnType::Credit, "1"),
            st("2024-12-10", TxnType::Credit, "1"),
            st("05/12/2024", TxnType::Credit, "1"),
            st("aaa", TxnType::Credit, "1"),
            st("2024-11-30", TxnType::Credit, "1"),
        ]);
        let order: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(order, vec!["2024-11-30", "05/12/2024", "2024-12-10", "aaa", "zzz"]);
    }

    #[test]
    fn test_unparsable_amount_skipped() {
        let days = daily_flow(&[st("2024-12-01", TxnType::Credit, "n/a")]);
        assert!(days.is_empty());
    }

    #[test]
    fn test_cumulative() {
        let days = daily_flow(&[
            st("2024-12-01", TxnType::Credit, "100"),
            st("2024-12-02", TxnType::Debit, "30"),
            st("2024-12-03", TxnType::Debit, "80"),
        ]);
        let running: Vec<Decimal> = cumulative_flow(&days).iter().map(|c| c.cumulative).collect();
        assert_eq!(running, vec![d("100"), d("70"), d("-10")]);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 5);
        assert_eq!(parse_statement_date("2024-12-05"), expected);
        assert_eq!(parse_statement_date("05/12/2024"), expected);
        assert_eq!(parse_statement_date("05 Dec 2024"), expected);
        assert_eq!(parse_statement_date("someday"), None);
    }
}
