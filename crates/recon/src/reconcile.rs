use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateBucket;
use crate::config::Tariff;
use crate::model::{CallDuration, CanonicalKey};
use crate::roster::RosterEntry;

/// Which side's unmatched keys still produce rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Inner join: only keys present on both sides.
    #[default]
    Matched,
    /// Every reference entry; unmatched ones carry zero totals.
    AllReference,
    /// Every bucket; unmatched ones are labelled with their own key.
    AllPrimary,
}

impl std::fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::AllReference => write!(f, "all_reference"),
            Self::AllPrimary => write!(f, "all_primary"),
        }
    }
}

/// One output line. Derived fields are full precision; rounding is the
/// report's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingRow {
    pub label: String,
    /// Canonical key, or the grouping label after [`regroup_by_label`].
    pub key: String,
    pub duration: CallDuration,
    pub duration_minutes: Decimal,
    pub amount: Decimal,
    pub rate: Decimal,
    pub amount_with_surcharge: Decimal,
    pub count: u64,
    pub matched: bool,
}

impl BillingRow {
    fn from_bucket(label: String, bucket: &AggregateBucket, tariff: &Tariff) -> Self {
        let duration_minutes = bucket.duration.minutes();
        Self {
            label,
            key: bucket.key.to_string(),
            duration: bucket.duration,
            duration_minutes,
            amount: bucket.amount,
            rate: duration_minutes * tariff.unit_rate,
            amount_with_surcharge: bucket.amount * tariff.surcharge_factor,
            count: bucket.count,
            matched: true,
        }
    }

    fn unmatched_reference(entry: &RosterEntry) -> Self {
        Self {
            label: entry.label.clone(),
            key: entry.key.to_string(),
            duration: CallDuration::default(),
            duration_minutes: Decimal::ZERO,
            amount: Decimal::ZERO,
            rate: Decimal::ZERO,
            amount_with_surcharge: Decimal::ZERO,
            count: 0,
            matched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub matched: u64,
    pub unmatched_buckets: u64,
    pub unmatched_references: u64,
    pub rows: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub rows: Vec<BillingRow>,
    pub stats: ReconcileStats,
}

/// Equi-join `primary` buckets against `reference` entries on the canonical
/// key. Reference order drives emission; the result is then stably sorted by
/// label (ordinal comparison).
pub fn reconcile(
    primary: &BTreeMap<CanonicalKey, AggregateBucket>,
    reference: &[RosterEntry],
    mode: ReconcileMode,
    tariff: &Tariff,
) -> Reconciliation {
    let mut rows = Vec::new();
    let mut stats = ReconcileStats::default();
    let mut claimed: HashSet<&CanonicalKey> = HashSet::new();

    for entry in reference {
        match primary.get(&entry.key) {
            Some(bucket) => {
                // A roster built by build_roster has unique keys, but a
                // hand-built reference may not; the first entry owns the bucket.
                if !claimed.insert(&bucket.key) {
                    continue;
                }
                stats.matched += 1;
                rows.push(BillingRow::from_bucket(entry.label.clone(), bucket, tariff));
            }
            None => {
                stats.unmatched_references += 1;
                if mode == ReconcileMode::AllReference {
                    rows.push(BillingRow::unmatched_reference(entry));
                }
            }
        }
    }

    for (key, bucket) in primary {
        if claimed.contains(key) {
            continue;
        }
        stats.unmatched_buckets += 1;
        if mode == ReconcileMode::AllPrimary {
            let mut row = BillingRow::from_bucket(key.to_string(), bucket, tariff);
            row.matched = false;
            rows.push(row);
        }
    }

    rows.sort_by(|a, b| a.label.cmp(&b.label));
    stats.rows = rows.len() as u64;

    if stats.unmatched_buckets > 0 || stats.unmatched_references > 0 {
        log::info!(
            "reconcile ({mode}): {} matched, {} bucket(s) without reference, {} reference(s) without activity",
            stats.matched,
            stats.unmatched_buckets,
            stats.unmatched_references
        );
    }

    Reconciliation { rows, stats }
}

/// Collapse rows that share a label, summing every numeric field. Output is
/// sorted by label.
pub fn regroup_by_label(rows: &[BillingRow]) -> Vec<BillingRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<BillingRow> = Vec::new();

    for row in rows {
        match index.get(row.label.as_str()) {
            Some(&i) => {
                let g = &mut grouped[i];
                g.duration += row.duration;
                g.duration_minutes += row.duration_minutes;
                g.amount += row.amount;
                g.rate += row.rate;
                g.amount_with_surcharge += row.amount_with_surcharge;
                g.count += row.count;
                g.matched |= row.matched;
            }
            None => {
                index.insert(row.label.as_str(), grouped.len());
                let mut g = row.clone();
                g.key = row.label.clone();
                grouped.push(g);
            }
        }
    }

    grouped.sort_by(|a, b| a.label.cmp(&b.label));
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregation;
    use crate::model::RawValue;
    use crate::normalize::normalize_phone_key;
    use crate::roster::Roster;

    fn key(s: &str) -> CanonicalKey {
        normalize_phone_key(&RawValue::text(s)).unwrap()
    }

    fn bucket(k: &str, secs: u64, cents: i64, count: u64) -> (CanonicalKey, AggregateBucket) {
        (
            key(k),
            AggregateBucket {
                key: key(k),
                duration: CallDuration::from_secs(secs),
                amount: Decimal::new(cents, 2),
                count,
            },
        )
    }

    fn entry(k: &str, label: &str) -> RosterEntry {
        RosterEntry { key: key(k), label: label.into() }
    }

    fn primary() -> BTreeMap<CanonicalKey, AggregateBucket> {
        BTreeMap::from([
            bucket("8005551234", 180, 0, 2),
            bucket("8885550000", 60, 0, 1),
            bucket("8775550000", 30, 0, 1),
        ])
    }

    #[test]
    fn inner_join_drops_both_kinds_of_orphans() {
        let reference = vec![entry("8885550000", "Globex"), entry("8005551234", "Acme"), entry("8665550000", "Idle")];
        let out = reconcile(&primary(), &reference, ReconcileMode::Matched, &Tariff::default());

        let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Acme", "Globex"]);
        assert_eq!(out.stats.matched, 2);
        assert_eq!(out.stats.unmatched_buckets, 1);
        assert_eq!(out.stats.unmatched_references, 1);
        assert_eq!(out.stats.rows, 2);
    }

    #[test]
    fn derived_fields_at_full_precision() {
        let reference = vec![entry("8005551234", "Acme")];
        let out = reconcile(&primary(), &reference, ReconcileMode::Matched, &Tariff::default());
        let row = &out.rows[0];
        assert_eq!(row.key, "8005551234");
        assert_eq!(row.duration, CallDuration::from_secs(180));
        assert_eq!(row.duration_minutes, Decimal::from(3));
        assert_eq!(row.rate, Decimal::new(105, 3));
    }

    #[test]
    fn all_reference_mode_keeps_idle_entries() {
        let reference = vec![entry("8005551234", "Acme"), entry("8665550000", "Idle")];
        let out = reconcile(&primary(), &reference, ReconcileMode::AllReference, &Tariff::default());
        assert_eq!(out.rows.len(), 2);
        let idle = out.rows.iter().find(|r| r.label == "Idle").unwrap();
        assert!(!idle.matched);
        assert_eq!(idle.count, 0);
    }

    #[test]
    fn all_primary_mode_labels_orphans_by_key() {
        let out = reconcile(&primary(), &[], ReconcileMode::AllPrimary, &Tariff::default());
        let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["8005551234", "8775550000", "8885550000"]);
        assert_eq!(out.stats.unmatched_buckets, 3);
    }

    #[test]
    fn equal_labels_keep_reference_order() {
        let reference = vec![entry("8885550000", "Same"), entry("8005551234", "Same")];
        let out = reconcile(&primary(), &reference, ReconcileMode::Matched, &Tariff::default());
        let keys: Vec<&str> = out.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["8885550000", "8005551234"]);
    }

    #[test]
    fn ordinal_sort_puts_uppercase_first() {
        let reference = vec![entry("8005551234", "acme"), entry("8885550000", "Zeta")];
        let out = reconcile(&primary(), &reference, ReconcileMode::Matched, &Tariff::default());
        let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Zeta", "acme"]);
    }

    #[test]
    fn regroup_sums_rows_sharing_a_label() {
        let reference = vec![
            entry("8005551234", "Acme"),
            entry("8885550000", "Globex"),
            entry("8775550000", "Acme"),
        ];
        let out = reconcile(&primary(), &reference, ReconcileMode::Matched, &Tariff::default());
        let grouped = regroup_by_label(&out.rows);
        assert_eq!(grouped.len(), 2);
        let acme = &grouped[0];
        assert_eq!(acme.label, "Acme");
        assert_eq!(acme.key, "Acme");
        assert_eq!(acme.duration, CallDuration::from_secs(210));
        assert_eq!(acme.count, 3);
        assert_eq!(acme.duration_minutes, Decimal::new(35, 1));
        assert_eq!(acme.rate, Decimal::new(1225, 4));
    }

    #[test]
    fn aggregate_joins_against_another_aggregate() {
        let other = Aggregation {
            buckets: BTreeMap::from([bucket("8885550000", 5, 0, 1), bucket("3105550000", 5, 0, 1)]),
            ..Aggregation::default()
        };
        let reference = Roster::from_aggregation(&other);
        assert_eq!(reference.stats.kept, 2);

        let out = reconcile(&primary(), &reference.entries, ReconcileMode::Matched, &Tariff::default());
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].label, "8885550000");
        assert_eq!(out.rows[0].duration, CallDuration::from_secs(60));
        assert_eq!(out.stats.unmatched_references, 1);
    }

    #[test]
    fn surcharge_applies_to_amount() {
        let primary = BTreeMap::from([bucket("2125550001", 120, 20000, 2)]);
        let reference = vec![entry("2125550001", "alpha.example")];
        let out = reconcile(&primary, &reference, ReconcileMode::Matched, &Tariff::default());
        assert_eq!(out.rows[0].amount_with_surcharge, Decimal::from(260));
    }
}
