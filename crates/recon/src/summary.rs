use serde::Serialize;

use crate::aggregate::AggregateStats;
use crate::filter::DateRange;
use crate::model::NormalizationWarnings;
use crate::reconcile::ReconcileStats;
use crate::roster::RosterStats;

/// Counters describing one run, from first record scanned to last row
/// emitted. Serialized verbatim by `--json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_read: u64,
    pub files_skipped_empty: u64,

    pub records_scanned: u64,
    pub rejected_response: u64,
    pub rejected_date: u64,
    pub missing_timestamp: u64,
    pub invalid_keys: u64,
    pub records_aggregated: u64,
    pub unique_keys: u64,

    pub roster_rows: u64,
    pub roster_entries: u64,
    pub roster_duplicates: u64,
    pub roster_placeholders_dropped: u64,
    pub roster_blank_labels_dropped: u64,
    pub roster_disabled: u64,
    pub roster_invalid_keys: u64,

    pub matched_keys: u64,
    pub unmatched_buckets: u64,
    pub unmatched_references: u64,
    pub output_rows: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub warnings: NormalizationWarnings,
}

impl RunSummary {
    pub fn record_aggregation(&mut self, stats: &AggregateStats, unique_keys: usize) {
        self.records_scanned = stats.scanned;
        self.rejected_response = stats.rejected_response;
        self.rejected_date = stats.rejected_date;
        self.missing_timestamp = stats.missing_timestamp;
        self.invalid_keys = stats.invalid_key;
        self.records_aggregated = stats.aggregated;
        self.unique_keys = unique_keys as u64;
    }

    pub fn record_roster(&mut self, stats: &RosterStats) {
        self.roster_rows = stats.scanned;
        self.roster_entries = stats.kept;
        self.roster_duplicates = stats.duplicates;
        self.roster_placeholders_dropped = stats.placeholder_dropped;
        self.roster_blank_labels_dropped = stats.blank_label_dropped;
        self.roster_disabled = stats.disabled;
        self.roster_invalid_keys = stats.invalid_key;
    }

    pub fn record_reconcile(&mut self, stats: &ReconcileStats) {
        self.matched_keys = stats.matched;
        self.unmatched_buckets = stats.unmatched_buckets;
        self.unmatched_references = stats.unmatched_references;
    }

    /// Records dropped before aggregation for any reason.
    pub fn records_skipped(&self) -> u64 {
        self.records_scanned.saturating_sub(self.records_aggregated)
    }
}
