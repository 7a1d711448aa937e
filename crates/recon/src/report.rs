//! Sheet assembly: reconciled rows → named sheets with fixed column sets.
//!
//! This is the only place numbers are rounded. Money and minutes are rendered
//! with exactly two decimals (half away from zero); whole-second durations and
//! record counts stay integers.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::reconcile::BillingRow;
use crate::roster::RosterEntry;

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(u64),
    /// Always carries scale 2.
    Decimal(Decimal),
}

impl CellValue {
    pub fn money(value: Decimal) -> Self {
        Self::Decimal(round_money(value))
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// Two decimals, midpoints away from zero, scale fixed at 2 so `3` prints
/// as `3.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    /// Column widths in characters, parallel to `columns`.
    #[serde(skip)]
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by column header, for callers that do not track positions.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }
}

/// Ordered sheets of one report. `primary` indexes the sheet a preview shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSet {
    pub sheets: Vec<Sheet>,
    #[serde(skip)]
    pub primary: usize,
}

impl SheetSet {
    pub fn primary(&self) -> Option<&Sheet> {
        self.sheets.get(self.primary)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Fixed projection of [`BillingRow`]s into one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Toll-free, per matched number.
    DurationSummary,
    /// Toll-free, regrouped by customer.
    BillingDetails,
    /// ANI totals.
    ProcessedData,
    /// Domain totals.
    ComparisonResult,
}

impl View {
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::DurationSummary => "Duration Summary",
            Self::BillingDetails => "Billing Details",
            Self::ProcessedData => "Processed Data",
            Self::ComparisonResult => "Comparison Result",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::DurationSummary => &["Total Duration (Seconds)", "Customer", "Phone Number"],
            Self::BillingDetails => &["Customer", "Duration (Seconds)", "Duration (Minutes)", "Rate ($)"],
            Self::ProcessedData => &[
                "ANI",
                "Total Duration",
                "Total Amount",
                "Amount with Interest (30%)",
                "Number of Records",
            ],
            Self::ComparisonResult => &[
                "ANI",
                "Total Duration (Minutes)",
                "Total Amount",
                "Amount with Interest (30%)",
                "Number of Records",
            ],
        }
    }

    pub fn widths(self) -> &'static [f64] {
        match self {
            Self::DurationSummary => &[25.0, 30.0, 18.0],
            Self::BillingDetails => &[30.0, 18.0, 18.0, 12.0],
            Self::ProcessedData => &[25.0, 15.0, 15.0, 25.0, 18.0],
            Self::ComparisonResult => &[30.0, 20.0, 15.0, 25.0, 18.0],
        }
    }

    pub fn project(self, row: &BillingRow) -> Vec<CellValue> {
        match self {
            Self::DurationSummary => vec![
                CellValue::Integer(row.duration.whole_seconds()),
                CellValue::Text(row.label.clone()),
                CellValue::Text(row.key.clone()),
            ],
            Self::BillingDetails => vec![
                CellValue::Text(row.label.clone()),
                CellValue::Integer(row.duration.whole_seconds()),
                CellValue::money(row.duration_minutes),
                CellValue::money(row.rate),
            ],
            Self::ProcessedData => vec![
                CellValue::Text(row.label.clone()),
                CellValue::money(row.duration.seconds()),
                CellValue::money(row.amount),
                CellValue::money(row.amount_with_surcharge),
                CellValue::Integer(row.count),
            ],
            Self::ComparisonResult => vec![
                CellValue::Text(row.label.clone()),
                CellValue::money(row.duration_minutes),
                CellValue::money(row.amount),
                CellValue::money(row.amount_with_surcharge),
                CellValue::Integer(row.count),
            ],
        }
    }

    pub fn render(self, rows: &[BillingRow]) -> Sheet {
        Sheet {
            name: self.sheet_name().to_string(),
            columns: self.columns().iter().map(|c| c.to_string()).collect(),
            widths: self.widths().to_vec(),
            rows: rows.iter().map(|r| self.project(r)).collect(),
        }
    }
}

/// Every roster entry, in roster order.
pub fn customer_info_sheet(entries: &[RosterEntry]) -> Sheet {
    Sheet {
        name: "Customer Info".into(),
        columns: vec!["Customer".into(), "Phone Number".into()],
        widths: vec![30.0, 18.0],
        rows: entries
            .iter()
            .map(|e| vec![CellValue::Text(e.label.clone()), CellValue::Text(e.key.to_string())])
            .collect(),
    }
}
