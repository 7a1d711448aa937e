use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::ReconError;
use crate::model::RawRecord;
use crate::normalize::parse_call_timestamp;

/// Inclusive calendar-day window. At least one bound is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, ReconError> {
        match (start, end) {
            (None, None) => Err(ReconError::InvalidDateRange(
                "select at least a start date or an end date".into(),
            )),
            (Some(s), Some(e)) if s > e => Err(ReconError::InvalidDateRange(format!(
                "start date {s} is after end date {e}"
            ))),
            _ => Ok(Self { start, end }),
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// 00:00:00.000 on the start date.
    pub fn lower_bound(&self) -> Option<NaiveDateTime> {
        self.start.map(|d| d.and_time(NaiveTime::MIN))
    }

    /// 23:59:59.999 on the end date.
    pub fn upper_bound(&self) -> Option<NaiveDateTime> {
        self.end
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if let Some(lo) = self.lower_bound() {
            if ts < lo {
                return false;
            }
        }
        if let Some(hi) = self.upper_bound() {
            if ts > hi {
                return false;
            }
        }
        true
    }

    /// `_{start}_to_{end}` with `start` / `end` standing in for open bounds.
    pub fn file_infix(&self) -> String {
        let fmt = |d: Option<NaiveDate>, open: &str| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| open.to_string())
        };
        format!("_{}_to_{}", fmt(self.start, "start"), fmt(self.end, "end"))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = |d: Option<NaiveDate>, open: &'static str| {
            d.map(|d| d.to_string()).unwrap_or_else(|| open.to_string())
        };
        write!(f, "{} to {}", fmt(self.start, "Start"), fmt(self.end, "End"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Response,
    OutOfRange,
    MissingTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

/// Composable row predicates, bound to one dataset's resolved columns.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    response: Option<(usize, String)>,
    date: Option<(usize, DateRange)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the text of column `col` to equal `expected` exactly.
    pub fn with_response(mut self, col: usize, expected: impl Into<String>) -> Self {
        self.response = Some((col, expected.into()));
        self
    }

    /// Require the timestamp in column `col` to fall inside `range`.
    pub fn with_date_range(mut self, col: usize, range: DateRange) -> Self {
        self.date = Some((col, range));
        self
    }

    pub fn is_active(&self) -> bool {
        self.response.is_some() || self.date.is_some()
    }

    pub fn accepts(&self, record: &RawRecord<'_>) -> Verdict {
        if let Some((col, expected)) = &self.response {
            if record.get(*col).as_text().as_ref() != expected.as_str() {
                return Verdict::Reject(Rejection::Response);
            }
        }
        if let Some((col, range)) = &self.date {
            match parse_call_timestamp(record.get(*col)) {
                None => return Verdict::Reject(Rejection::MissingTimestamp),
                Some(ts) if !range.contains(ts) => {
                    return Verdict::Reject(Rejection::OutOfRange)
                }
                Some(_) => {}
            }
        }
        Verdict::Accept
    }
}
