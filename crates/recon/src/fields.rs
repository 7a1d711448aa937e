//! Column resolution: loosely named input headers → canonical fields.
//!
//! Each canonical field owns an ordered alias list. A header whose trimmed,
//! lower-cased label equals an alias wins outright; otherwise the first
//! header in the dataset's own column order that contains an alias is taken.
//! Resolution happens once per dataset, before any row is read.

use crate::error::ReconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Destination,
    Response,
    Duration,
    Phone,
    Customer,
    Ani,
    TotalAmount,
    CallTime,
    Domain,
    Enable,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::Response => "response",
            Self::Duration => "duration",
            Self::Phone => "phone",
            Self::Customer => "customer",
            Self::Ani => "ani",
            Self::TotalAmount => "total_amount",
            Self::CallTime => "call_time",
            Self::Domain => "domain",
            Self::Enable => "enable",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Destination => &["destination", "called"],
            Self::Response => &["response"],
            Self::Duration => &["duration"],
            Self::Phone => &["phone"],
            Self::Customer => &["customer", "name"],
            Self::Ani => &["ani"],
            Self::TotalAmount => &["total_amount", "total amount"],
            Self::CallTime => &["call_time", "call time"],
            Self::Domain => &["domain"],
            Self::Enable => &["enable"],
        }
    }

    /// Human label for error messages, e.g. `destination/called`.
    pub fn describe(self) -> String {
        self.aliases().join("/")
    }

    fn is_exact(self, header: &str) -> bool {
        let lower = header.trim().to_lowercase();
        self.aliases().iter().any(|alias| lower == *alias)
    }

    fn is_partial(self, header: &str) -> bool {
        let lower = header.trim().to_lowercase();
        self.aliases().iter().any(|alias| lower.contains(alias))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of the header for `field`, if any. An exact alias match beats a
/// header that merely contains an alias, so `ani` is never read from
/// `Organization` when an `ani` column exists.
pub fn resolve(headers: &[String], field: Field) -> Option<usize> {
    headers
        .iter()
        .position(|h| field.is_exact(h))
        .or_else(|| headers.iter().position(|h| field.is_partial(h)))
}

/// Resolve every field in `fields` to its column index, in the same order.
/// Fails fast with one schema error listing every field that is absent.
pub fn resolve_columns<const N: usize>(
    source_name: &str,
    headers: &[String],
    fields: [Field; N],
) -> Result<[usize; N], ReconError> {
    let mut columns = [0usize; N];
    let mut missing = Vec::new();

    for (slot, field) in columns.iter_mut().zip(fields) {
        match resolve(headers, field) {
            Some(idx) => *slot = idx,
            None => missing.push(field.describe()),
        }
    }

    if !missing.is_empty() {
        return Err(ReconError::Schema {
            source_name: source_name.to_string(),
            missing,
        });
    }

    log::debug!(
        "{source_name}: resolved {}",
        fields
            .iter()
            .zip(columns)
            .map(|(f, i)| format!("{f}={:?}", headers[i]))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(columns)
}
