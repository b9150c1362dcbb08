//! Categorical flow: credit sources feed a `Total Income` hub, which feeds debit sinks.

use rust_decimal::Decimal;
use serde::Serialize;

use kwgn_core::{SourcedTransaction, TxnType, parse_amount};

pub const HUB_NAME: &str = "Total Income";
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Credit,
    Total,
    Debit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub name: String,
    pub value: Decimal,
    pub kind: NodeKind,
}

/// Edge between two node indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    pub fn hub(&self) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Total)
    }
}

/// Insertion-ordered sum per label
fn accumulate(groups: &mut Vec<(String, Decimal)>, label: &str, amount: Decimal) {
    match groups.iter_mut().find(|(l, _)| l == label) {
        Some((_, total)) => *total += amount,
        None => groups.push((label.to_string(), amount)),
    }
}

/// Build the graph. Groups keep first-seen order; amounts are taken by magnitude.
pub fn flow_graph(txns: &[SourcedTransaction]) -> FlowGraph {
    let mut credits: Vec<(String, Decimal)> = Vec::new();
    let mut debits: Vec<(String, Decimal)> = Vec::new();

    for st in txns {
        let t = &st.transaction;
        let Some(amount) = parse_amount(&t.amount) else {
            continue;
        };
        let label = t.primary_label().unwrap_or(UNKNOWN_LABEL);
        match t.kind {
            TxnType::Credit => accumulate(&mut credits, label, amount.abs()),
            TxnType::Debit => accumulate(&mut debits, label, amount.abs()),
        }
    }

    let total_credit: Decimal = credits.iter().map(|(_, v)| *v).sum();
    let hub = credits.len();

    let mut graph = FlowGraph::default();
    for (i, (label, value)) in credits.into_iter().enumerate() {
        graph.links.push(FlowLink {
            source: i,
            target: hub,
            value,
        });
        graph.nodes.push(FlowNode {
            id: format!("credit_{label}"),
            name: label,
            value,
            kind: NodeKind::Credit,
        });
    }
    graph.nodes.push(FlowNode {
        id: "total_income".to_string(),
        name: HUB_NAME.to_string(),
        value: total_credit,
        kind: NodeKind::Total,
    });
    for (i, (label, value)) in debits.into_iter().enumerate() {
        graph.links.push(FlowLink {
            source: hub,
            target: hub + 1 + i,
            value,
        });
        graph.nodes.push(FlowNode {
            id: format!("debit_{label}"),
            name: label,
            value,
            kind: NodeKind::Debit,
        });
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwgn_core::{FileId, Transaction};
    use std::str::FromStr;

    fn st(descriptions: &[&str], kind: TxnType, amount: &str) -> SourcedTransaction {
        SourcedTransaction {
            file_id: FileId::new(1, 0),
            source: "s.pdf".to_string(),
            transaction: Transaction {
                sequence: 1,
                date: "2024-12-01".to_string(),
                descriptions: descriptions.iter().map(|s| s.to_string()).collect(),
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
    fn test_layout() {
        let graph = flow_graph(&[
            st(&["SALARY", "CO ABC"], TxnType::Credit, "3500.00"),
            st(&["GROCER"], TxnType::Debit, "-45.50"),
            st(&["REFUND"], TxnType::Credit, "20.00"),
            st(&["GROCER"], TxnType::Debit, "4.50"),
            st(&[], TxnType::Debit, "10.00"),
        ]);

        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["SALARY", "REFUND", "Total Income", "GROCER", "Unknown"]);
        assert_eq!(graph.hub().unwrap().value, d("3520.00"));
        assert_eq!(graph.nodes[3].value, d("50.00"));

        let edges: Vec<(usize, usize)> = graph.links.iter().map(|l| (l.source, l.target)).collect();
        assert_eq!(edges, vec![(0, 2), (1, 2), (2, 3), (2, 4)]);
    }

    #[test]
    fn test_labels_group_as_written() {
        let graph = flow_graph(&[
            st(&["GROCER"], TxnType::Debit, "-1.00"),
            st(&[" GROCER"], TxnType::Debit, "-2.00"),
            st(&[""], TxnType::Debit, "-3.00"),
        ]);

        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Total Income", "GROCER", " GROCER", "Unknown"]);
        assert_eq!(graph.nodes[2].value, d("2.00"));
    }

    #[test]
    fn test_empty_has_only_hub() {
        let graph = flow_graph(&[]);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.hub().unwrap().value, Decimal::ZERO);
        assert!(graph.links.is_empty());
    }
}
