use std::borrow::Cow;
use std::fmt;
use std::ops::AddAssign;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single cell as handed over by the file reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Text rendering used for comparisons and digit extraction.
    /// Whole numbers print without a fractional part.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Cow::Owned(format!("{}", *n as i64))
                } else {
                    Cow::Owned(format!("{}", n))
                }
            }
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One dataset as read from a file: header labels in original order plus rows.
/// Rows may be shorter than the header; missing trailing cells read as empty.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(move |values| RawRecord {
            headers: &self.headers,
            values,
        })
    }
}

/// Borrowed view of one row, addressed by resolved column index.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    headers: &'a [String],
    values: &'a [RawValue],
}

static EMPTY: RawValue = RawValue::Empty;

impl<'a> RawRecord<'a> {
    pub fn new(headers: &'a [String], values: &'a [RawValue]) -> Self {
        Self { headers, values }
    }

    pub fn get(&self, col: usize) -> &'a RawValue {
        self.values.get(col).unwrap_or(&EMPTY)
    }

    /// Lookup by exact header label.
    pub fn by_label(&self, label: &str) -> &'a RawValue {
        self.headers
            .iter()
            .position(|h| h == label)
            .map(|i| self.get(i))
            .unwrap_or(&EMPTY)
    }
}

// ---------------------------------------------------------------------------
// Canonical values
// ---------------------------------------------------------------------------

/// Normalized 10-digit identifier used for grouping and joining.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Caller guarantees `digits` already passed key validation.
    pub(crate) fn from_digits(digits: String) -> Self {
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-digit area code.
    pub fn prefix(&self) -> &str {
        &self.0[..3]
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call time in seconds. Toll-free logs only ever produce whole seconds;
/// ANI logs may carry fractions, which are kept exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CallDuration(pub Decimal);

impl CallDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Decimal::from(secs))
    }

    pub fn seconds(self) -> Decimal {
        self.0
    }

    /// Seconds with any fraction dropped, for integer report columns.
    pub fn whole_seconds(self) -> u64 {
        self.0.trunc().to_u64().unwrap_or(0)
    }

    /// Full-precision minutes; rounding happens at presentation.
    pub fn minutes(self) -> Decimal {
        self.0 / Decimal::from(60u64)
    }
}

impl AddAssign for CallDuration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Cells that failed to normalize. Never fatal: the value was zeroed or the
/// record excluded, and the occurrence counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationWarnings {
    pub bad_durations: u64,
    pub bad_amounts: u64,
    pub bad_timestamps: u64,
    pub invalid_keys: u64,
}

impl NormalizationWarnings {
    pub fn total(&self) -> u64 {
        self.bad_durations + self.bad_amounts + self.bad_timestamps + self.invalid_keys
    }

    pub fn merge(&mut self, other: &Self) {
        self.bad_durations += other.bad_durations;
        self.bad_amounts += other.bad_amounts;
        self.bad_timestamps += other.bad_timestamps;
        self.invalid_keys += other.invalid_keys;
    }
}
