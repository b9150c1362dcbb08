//! CSV export of session transactions.
//!
//! Header: `sequence,date,description,type,amount,balance,ref,source`.
//! Amounts and balances are written exactly as the engine produced them.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use kwgn_core::{FileResult, SourcedTransaction};

pub const CSV_HEADERS: [&str; 8] = [
    "sequence",
    "date",
    "description",
    "type",
    "amount",
    "balance",
    "ref",
    "source",
];

/// Separator between description lines in the `description` column
pub const DESCRIPTION_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub sequence: u32,
    pub date: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    pub balance: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub source: String,
}

impl CsvRow {
    fn fields(&self) -> [String; 8] {
        [
            self.sequence.to_string(),
            self.date.clone(),
            self.description.clone(),
            self.kind.clone(),
            self.amount.clone(),
            self.balance.clone(),
            self.reference.clone(),
            self.source.clone(),
        ]
    }
}

pub fn to_csv_rows(txns: &[SourcedTransaction]) -> Vec<CsvRow> {
    txns.iter()
        .map(|st| {
            let t = &st.transaction;
            CsvRow {
                sequence: t.sequence,
                date: t.date.clone(),
                description: t.descriptions.join(DESCRIPTION_SEPARATOR),
                kind: t.kind.to_string(),
                amount: t.amount.clone(),
                balance: t.balance.clone(),
                reference: t.reference.clone(),
                source: st.source.clone(),
            }
        })
        .collect()
}

/// Rows straight from decoded log results, tagging each with its block's file name.
pub fn rows_from_results(results: &[FileResult]) -> Vec<CsvRow> {
    results
        .iter()
        .filter_map(|r| r.payload.as_ref().map(|p| (r, p)))
        .flat_map(|(r, p)| {
            p.transactions.iter().map(move |t| CsvRow {
                sequence: t.sequence,
                date: t.date.clone(),
                description: t.descriptions.join(DESCRIPTION_SEPARATOR),
                kind: t.kind.to_string(),
                amount: t.amount.clone(),
                balance: t.balance.clone(),
                reference: t.reference.clone(),
                source: r.name.clone(),
            })
        })
        .collect()
}

/// Write header + rows. Fields with a comma, quote or newline are quoted.
pub fn write_csv<W: Write>(writer: W, rows: &[CsvRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(CSV_HEADERS).context("writing CSV header")?;
    for row in rows {
        wtr.write_record(row.fields())
            .with_context(|| format!("writing CSV row {}", row.sequence))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub fn to_csv_string(rows: &[CsvRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwgn_core::{FileId, Transaction, TxnType};

    fn sourced(descriptions: &[&str], source: &str) -> SourcedTransaction {
        SourcedTransaction {
            file_id: FileId::new(1, 0),
            source: source.to_string(),
            transaction: Transaction {
                sequence: 1,
                date: "2024-12-01".to_string(),
                descriptions: descriptions.iter().map(|s| s.to_string()).collect(),
                kind: TxnType::Credit,
                amount: "3500.00".to_string(),
                balance: "8945.75".to_string(),
                reference: "FT1".to_string(),
            },
        }
    }

    #[test]
    fn test_salary_row() {
        let rows = to_csv_rows(&[sourced(&["SALARY", "CO ABC"], "dec.pdf")]);
        let csv = to_csv_string(&rows).unwrap();
        assert_eq!(
            csv,
            "sequence,date,description,type,amount,balance,ref,source\n\
             1,2024-12-01,SALARY | CO ABC,credit,3500.00,8945.75,FT1,dec.pdf\n"
        );
    }

    #[test]
    fn test_quoting() {
        let rows = to_csv_rows(&[sourced(&["TRANSFER, \"JOHN\"", "line\nbreak"], "a,b.pdf")]);
        let csv = to_csv_string(&rows).unwrap();
        let body = csv.split_once('\n').unwrap().1;
        assert_eq!(
            body,
            "1,2024-12-01,\"TRANSFER, \"\"JOHN\"\" | line\nbreak\",credit,3500.00,8945.75,FT1,\"a,b.pdf\"\n"
        );
    }

    #[test]
    fn test_empty_descriptions() {
        let rows = to_csv_rows(&[sourced(&[], "x.pdf")]);
        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn test_header_only_when_no_rows() {
        assert_eq!(
            to_csv_string(&[]).unwrap(),
            "sequence,date,description,type,amount,balance,ref,source\n"
        );
    }
}
