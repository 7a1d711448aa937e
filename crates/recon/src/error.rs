use thiserror::Error;

/// Run-level failures. Anything that reaches this type aborts the run before
/// a report is produced; cell-level problems are tallied in
/// [`NormalizationWarnings`](crate::model::NormalizationWarnings) instead.
#[derive(Debug, Error)]
pub enum ReconError {
    /// One or more required canonical fields have no matching column.
    #[error("{}: missing required column(s): {}", .source_name, .missing.join(", "))]
    Schema {
        source_name: String,
        missing: Vec<String>,
    },

    /// A source dataset produced no usable rows.
    #[error("{source_name}: {detail}")]
    EmptyDataset { source_name: String, detail: String },

    /// Nothing survived reconciliation.
    #[error("no billable rows: {0}")]
    NoMatch(String),

    /// Date filter requested with no bounds, or with start after end.
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (bad prefix, non-positive rate, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl ReconError {
    pub fn empty(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EmptyDataset {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_field() {
        let err = ReconError::Schema {
            source_name: "calls.csv".into(),
            missing: vec!["destination".into(), "response".into()],
        };
        assert_eq!(
            err.to_string(),
            "calls.csv: missing required column(s): destination, response"
        );
    }

    #[test]
    fn empty_dataset_message() {
        let err = ReconError::empty("roster.xlsx", "file contains no rows");
        assert_eq!(err.to_string(), "roster.xlsx: file contains no rows");
    }
}
