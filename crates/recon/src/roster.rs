use std::collections::HashSet;

use serde::Serialize;

use crate::aggregate::Aggregation;
use crate::model::{CanonicalKey, RawTable};
use crate::normalize::{normalize_display_label, normalize_enable_flag, KeyRule, LabelOutcome, PlaceholderPolicy};

/// One billable subscriber: the join key plus what to show for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub key: CanonicalKey,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub scanned: u64,
    pub invalid_key: u64,
    pub disabled: u64,
    pub placeholder_dropped: u64,
    pub blank_label_dropped: u64,
    pub duplicates: u64,
    pub kept: u64,
}

/// Deduplicated roster in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub stats: RosterStats,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Treat an aggregate as a reference side, labelled by its own keys.
    /// Used for aggregate-to-aggregate joins.
    pub fn from_aggregation(agg: &Aggregation) -> Self {
        let entries: Vec<RosterEntry> = agg
            .buckets
            .keys()
            .map(|key| RosterEntry {
                key: key.clone(),
                label: key.to_string(),
            })
            .collect();
        let n = entries.len() as u64;
        Self {
            entries,
            stats: RosterStats {
                scanned: n,
                kept: n,
                ..RosterStats::default()
            },
        }
    }
}

/// Where the roster's fields live in its table.
#[derive(Debug, Clone, Copy)]
pub struct RosterColumns {
    pub key: usize,
    pub label: usize,
    pub enable: Option<usize>,
}

/// Which rows become entries.
#[derive(Debug, Clone)]
pub struct RosterRules {
    pub key_rule: KeyRule,
    pub placeholder: PlaceholderPolicy,
    /// Drop rows whose label is blank instead of relabelling them `Unknown`.
    pub require_label: bool,
}

/// Build the roster. Filtering happens before deduplication, so a dropped
/// row never claims its key: a later valid row for the same number still
/// gets in.
pub fn build_roster(table: &RawTable, columns: RosterColumns, rules: &RosterRules) -> Roster {
    let mut seen: HashSet<CanonicalKey> = HashSet::new();
    let mut roster = Roster::default();

    for record in table.records() {
        let stats = &mut roster.stats;
        stats.scanned += 1;

        if let Some(col) = columns.enable {
            if !normalize_enable_flag(record.get(col)) {
                stats.disabled += 1;
                continue;
            }
        }

        let Some(key) = rules.key_rule.extract(record.get(columns.key)) else {
            stats.invalid_key += 1;
            continue;
        };

        let raw_label = record.get(columns.label);
        if rules.require_label && raw_label.is_empty() {
            stats.blank_label_dropped += 1;
            continue;
        }
        let label = match normalize_display_label(raw_label, rules.placeholder) {
            LabelOutcome::Label(label) => label,
            LabelOutcome::Exclude => {
                stats.placeholder_dropped += 1;
                continue;
            }
        };

        if !seen.insert(key.clone()) {
            stats.duplicates += 1;
            continue;
        }

        stats.kept += 1;
        roster.entries.push(RosterEntry { key, label });
    }

    log::debug!(
        "{}: {} roster entr(ies) kept of {} row(s); {} duplicate, {} placeholder, {} disabled, {} invalid key",
        table.name,
        roster.stats.kept,
        roster.stats.scanned,
        roster.stats.duplicates,
        roster.stats.placeholder_dropped,
        roster.stats.disabled,
        roster.stats.invalid_key,
    );

    roster
}
