//! Cell-level normalizers. Every function here is pure and total: bad input
//! yields `None`, zero, or a sentinel, never an error. Callers decide whether
//! an unusable value excludes the record.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::model::{CallDuration, CanonicalKey, RawValue};

/// Label used when a display label is blank or a placeholder.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Placeholder that roster exports use for "no customer".
pub const PLACEHOLDER_LABEL: &str = "-";

pub const DEFAULT_TOLL_FREE_PREFIXES: [&str; 10] =
    ["800", "811", "822", "833", "844", "855", "866", "877", "888", "899"];

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

fn digits_only(raw: &RawValue) -> String {
    raw.as_text().chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip to digits, drop a leading `1` from 11-digit numbers, and accept only
/// the resulting 10-digit form.
pub fn normalize_phone_key(raw: &RawValue) -> Option<CanonicalKey> {
    let digits = digits_only(raw);
    let ten = match digits.len() {
        10 => digits,
        11 if digits.starts_with('1') => digits[1..].to_string(),
        _ => return None,
    };
    Some(CanonicalKey::from_digits(ten))
}

/// Phone key restricted to the default toll-free prefixes.
pub fn normalize_toll_free_key(raw: &RawValue) -> Option<CanonicalKey> {
    KeyRule::toll_free_default().extract(raw)
}

/// How a column value becomes a [`CanonicalKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    Phone,
    TollFree { prefixes: Vec<String> },
}

impl KeyRule {
    pub fn toll_free_default() -> Self {
        Self::TollFree {
            prefixes: DEFAULT_TOLL_FREE_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn extract(&self, raw: &RawValue) -> Option<CanonicalKey> {
        let key = normalize_phone_key(raw)?;
        match self {
            Self::Phone => Some(key),
            Self::TollFree { prefixes } => {
                if prefixes.iter().any(|p| p == key.prefix()) {
                    Some(key)
                } else {
                    None
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Duration
// ---------------------------------------------------------------------------

fn parse_clock_field(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn seconds_from_number(n: f64) -> Option<u64> {
    if n.is_finite() && n >= 0.0 {
        Some(n.trunc() as u64)
    } else {
        None
    }
}

/// Bare digits or `MM:SS` / `HH:MM:SS`, as whole seconds. `None` for any
/// other shape; the caller decides whether a decimal string is acceptable.
fn parse_whole_duration(s: &str) -> Option<u64> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    if !s.contains(':') {
        return None;
    }
    let fields: Option<Vec<u64>> = s.split(':').map(parse_clock_field).collect();
    match fields?.as_slice() {
        [h, m, sec] => h.checked_mul(3600)?.checked_add(m.checked_mul(60)?)?.checked_add(*sec),
        [m, sec] => m.checked_mul(60)?.checked_add(*sec),
        _ => None,
    }
}

/// Whole-second duration, or `None` when the cell holds something that is
/// not a recognizable duration. Empty cells are a valid zero.
///
/// Accepted: native numbers (fraction dropped), bare integer strings,
/// `MM:SS` and `HH:MM:SS`. Decimal strings such as `12.5` are not durations
/// here.
pub fn parse_duration(raw: &RawValue) -> Option<CallDuration> {
    match raw {
        RawValue::Empty => Some(CallDuration::default()),
        RawValue::Number(n) => seconds_from_number(*n).map(CallDuration::from_secs),
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(CallDuration::default());
            }
            parse_whole_duration(s).map(CallDuration::from_secs)
        }
    }
}

/// Like [`parse_duration`] but keeps fractional seconds, from native numbers
/// and from decimal strings (`12.5`, `1e2`). Negative values are rejected.
pub fn parse_fractional_duration(raw: &RawValue) -> Option<CallDuration> {
    let seconds = match raw {
        RawValue::Number(n) if n.is_finite() => Decimal::from_f64(*n)?,
        RawValue::Number(_) => return None,
        RawValue::Text(s) if s.contains(':') => return parse_duration(raw),
        RawValue::Text(s) if !s.trim().is_empty() => {
            let s = s.trim();
            Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()?
        }
        _ => return Some(CallDuration::default()),
    };
    if seconds.is_sign_negative() && !seconds.is_zero() {
        return None;
    }
    Some(CallDuration(seconds.normalize()))
}

/// Total form of [`parse_duration`]: anything unrecognizable is zero.
pub fn normalize_duration(raw: &RawValue) -> CallDuration {
    parse_duration(raw).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Decimal amount, or `None` when the cell is not numeric. Empty is zero.
/// A leading currency sign and thousands separators are tolerated.
pub fn parse_amount(raw: &RawValue) -> Option<Decimal> {
    match raw {
        RawValue::Empty => Some(Decimal::ZERO),
        RawValue::Number(n) => Decimal::from_f64(*n),
        RawValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return Some(Decimal::ZERO);
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
    }
}

pub fn normalize_amount(raw: &RawValue) -> Decimal {
    parse_amount(raw).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// What to do with a label that is exactly the `-` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderPolicy {
    /// Treat it like any other blank label.
    Relabel,
    /// Drop the whole record.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutcome {
    Label(String),
    Exclude,
}

pub fn normalize_display_label(raw: &RawValue, policy: PlaceholderPolicy) -> LabelOutcome {
    let text = raw.as_text();
    let trimmed = text.trim();
    if trimmed == PLACEHOLDER_LABEL && policy == PlaceholderPolicy::Exclude {
        return LabelOutcome::Exclude;
    }
    if trimmed.is_empty() || trimmed == PLACEHOLDER_LABEL || trimmed == UNKNOWN_LABEL {
        return LabelOutcome::Label(UNKNOWN_LABEL.to_string());
    }
    LabelOutcome::Label(trimmed.to_string())
}

/// `yes` / `true` (any case, surrounding blanks ignored) enable an entry.
pub fn normalize_enable_flag(raw: &RawValue) -> bool {
    let text = raw.as_text();
    let flag = text.trim();
    flag.eq_ignore_ascii_case("yes") || flag.eq_ignore_ascii_case("true")
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

fn lenient_int(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Month-first `M/D/YYYY[ H:M[:S]]` or `M-D-YYYY[ H:M[:S]]`. Two-digit years
/// are taken as 20xx. Impossible calendar dates yield `None`.
pub fn parse_call_timestamp(raw: &RawValue) -> Option<NaiveDateTime> {
    let text = raw.as_text();
    let mut parts = text.split_whitespace();
    let date_part = parts.next()?;
    let time_part = parts.next();

    let sep = if date_part.contains('/') {
        '/'
    } else if date_part.contains('-') {
        '-'
    } else {
        return None;
    };

    let nums: Vec<&str> = date_part.split(sep).collect();
    if nums.len() != 3 {
        return None;
    }
    let month = lenient_int(nums[0])?;
    let day = lenient_int(nums[1])?;
    let mut year = lenient_int(nums[2])? as i32;
    if year < 100 {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time_part {
        None => NaiveTime::MIN,
        Some(t) => {
            let mut fields = t.split(':').map(|f| lenient_int(f).unwrap_or(0));
            let h = fields.next().unwrap_or(0);
            let m = fields.next().unwrap_or(0);
            let s = fields.next().unwrap_or(0);
            NaiveTime::from_hms_opt(h, m, s)?
        }
    };

    Some(date.and_time(time))
}
