// src/analysis/flow.rs

use crate::config::{PlLine, PlTable};

/// Parses a P&L cell. Blank, malformed and non-finite input yield `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn amount_or_zero(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

pub fn net_profit(revenue: &str, cogs: &str, operating_expenses: &str) -> f64 {
    amount_or_zero(revenue) - amount_or_zero(cogs) - amount_or_zero(operating_expenses)
}

/// Shortest decimal that round-trips, with `-0` folded into `0`.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn edge(&self, source: &str, target: &str) -> Option<&FlowEdge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }
}

/// Revenue fans out into COGs, Operating Expenses and Net Profit.
/// Always recomputes Net Profit from the inputs; the stored cell is ignored.
pub fn derive_flows(table: &PlTable) -> FlowGraph {
    let revenue = PlLine::Revenue.label();
    let edge = |line: PlLine, value: f64| FlowEdge {
        source: revenue.to_string(),
        target: line.label().to_string(),
        value,
    };

    FlowGraph {
        nodes: PlLine::ALL
            .iter()
            .map(|line| FlowNode {
                name: line.label().to_string(),
            })
            .collect(),
        edges: vec![
            edge(PlLine::Cogs, amount_or_zero(table.value(PlLine::Cogs))),
            edge(
                PlLine::OperatingExpenses,
                amount_or_zero(table.value(PlLine::OperatingExpenses)),
            ),
            edge(PlLine::NetProfit, table.net_profit()),
        ],
    }
}
