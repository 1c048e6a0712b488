// src/config/pl.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::flow::{self, parse_amount};
use crate::error::ValidationError;

/// The four fixed lines of a P&L table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlLine {
    Revenue,
    Cogs,
    OperatingExpenses,
    NetProfit,
}

impl PlLine {
    pub const ALL: [PlLine; 4] = [
        PlLine::Revenue,
        PlLine::Cogs,
        PlLine::OperatingExpenses,
        PlLine::NetProfit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlLine::Revenue => "Revenue",
            PlLine::Cogs => "COGs",
            PlLine::OperatingExpenses => "Operating Expenses",
            PlLine::NetProfit => "Net Profit",
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlLine::Revenue => 0,
            PlLine::Cogs => 1,
            PlLine::OperatingExpenses => 2,
            PlLine::NetProfit => 3,
        }
    }

    /// Net Profit is always derived.
    pub fn is_editable(self) -> bool {
        self != PlLine::NetProfit
    }
}

impl fmt::Display for PlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlRow {
    pub label: String,
    pub value: String,
}

impl PlRow {
    fn empty(line: PlLine) -> Self {
        Self {
            label: line.label().to_string(),
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableShapeError {
    #[error("expected 4 P&L rows, found {0}")]
    WrongRowCount(usize),

    #[error("row {index} should be {expected:?}, found {found:?}")]
    WrongLabel {
        index: usize,
        expected: &'static str,
        found: String,
    },
}

/// Exactly four rows in the fixed Revenue, COGs, Operating Expenses, Net Profit order.
/// Serialized as a plain list so stored documents keep the `plRows` array shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlRow>", into = "Vec<PlRow>")]
pub struct PlTable {
    rows: [PlRow; 4],
}

impl Default for PlTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl PlTable {
    /// All four rows blank, including Net Profit.
    pub fn empty() -> Self {
        Self {
            rows: PlLine::ALL.map(PlRow::empty),
        }
    }

    /// Builds a table from the three editable values; Net Profit is derived.
    #[cfg(test)]
    pub fn from_values(revenue: &str, cogs: &str, operating_expenses: &str) -> Self {
        let mut table = Self::empty();
        table.rows[PlLine::Revenue.index()].value = revenue.to_string();
        table.rows[PlLine::Cogs.index()].value = cogs.to_string();
        table.rows[PlLine::OperatingExpenses.index()].value = operating_expenses.to_string();
        table.recompute_net_profit();
        table
    }

    pub fn value(&self, line: PlLine) -> &str {
        &self.rows[line.index()].value
    }

    /// Edits one of the three input rows and re-derives Net Profit.
    /// Returns false (and changes nothing) for the Net Profit row.
    pub fn set_value(&mut self, line: PlLine, value: impl Into<String>) -> bool {
        if !line.is_editable() {
            return false;
        }
        self.rows[line.index()].value = value.into();
        self.recompute_net_profit();
        true
    }

    pub fn net_profit(&self) -> f64 {
        flow::net_profit(
            self.value(PlLine::Revenue),
            self.value(PlLine::Cogs),
            self.value(PlLine::OperatingExpenses),
        )
    }

    pub fn recompute_net_profit(&mut self) {
        self.rows[PlLine::NetProfit.index()].value = flow::format_amount(self.net_profit());
    }

    /// Every editable row must hold a number; blank does not count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for line in PlLine::ALL.into_iter().filter(|l| l.is_editable()) {
            let value = self.value(line);
            if parse_amount(value).is_none() {
                return Err(ValidationError::InvalidNumber {
                    line,
                    value: value.to_string(),
                });
            }
        }
        // Finite inputs can still overflow once combined.
        if !self.net_profit().is_finite() {
            return Err(ValidationError::InvalidNumber {
                line: PlLine::NetProfit,
                value: flow::format_amount(self.net_profit()),
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<PlRow>> for PlTable {
    type Error = TableShapeError;

    fn try_from(rows: Vec<PlRow>) -> Result<Self, Self::Error> {
        let count = rows.len();
        let rows: [PlRow; 4] = rows
            .try_into()
            .map_err(|_| TableShapeError::WrongRowCount(count))?;

        for (index, (row, line)) in rows.iter().zip(PlLine::ALL).enumerate() {
            if row.label != line.label() {
                return Err(TableShapeError::WrongLabel {
                    index,
                    expected: line.label(),
                    found: row.label.clone(),
                });
            }
        }

        Ok(Self { rows })
    }
}

impl From<PlTable> for Vec<PlRow> {
    fn from(table: PlTable) -> Self {
        table.rows.into()
    }
}
