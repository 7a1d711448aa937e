use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::filter::{Rejection, Verdict};
use crate::model::{CallDuration, CanonicalKey, NormalizationWarnings};

/// Running totals for one canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateBucket {
    pub key: CanonicalKey,
    pub duration: CallDuration,
    pub amount: Decimal,
    pub count: u64,
}

impl AggregateBucket {
    fn new(key: CanonicalKey) -> Self {
        Self {
            key,
            duration: CallDuration::default(),
            amount: Decimal::ZERO,
            count: 0,
        }
    }
}

/// Per-record numeric contribution. `None` marks a cell that failed to
/// normalize; it contributes zero and is tallied as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Measure {
    pub duration: Option<CallDuration>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Every record offered, accepted or not.
    pub scanned: u64,
    pub rejected_response: u64,
    pub rejected_date: u64,
    pub missing_timestamp: u64,
    pub invalid_key: u64,
    pub aggregated: u64,
}

impl AggregateStats {
    pub fn skipped(&self) -> u64 {
        self.scanned - self.aggregated
    }
}

/// Keyed buckets plus the counters gathered while building them.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Iterates in key order, which is also the reporting order.
    pub buckets: BTreeMap<CanonicalKey, AggregateBucket>,
    pub stats: AggregateStats,
    pub warnings: NormalizationWarnings,
}

impl Aggregation {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&AggregateBucket> {
        self.buckets.get(key)
    }
}

/// Incremental aggregator, so several datasets (each with its own column
/// layout) can feed one set of buckets.
#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Aggregation,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<R>(
        &mut self,
        records: impl IntoIterator<Item = R>,
        mut key_fn: impl FnMut(&R) -> Option<CanonicalKey>,
        mut filter_fn: impl FnMut(&R) -> Verdict,
        mut measure_fn: impl FnMut(&R) -> Measure,
    ) {
        let agg = &mut self.inner;
        for record in records {
            agg.stats.scanned += 1;

            match filter_fn(&record) {
                Verdict::Accept => {}
                Verdict::Reject(Rejection::Response) => {
                    agg.stats.rejected_response += 1;
                    continue;
                }
                Verdict::Reject(Rejection::OutOfRange) => {
                    agg.stats.rejected_date += 1;
                    continue;
                }
                Verdict::Reject(Rejection::MissingTimestamp) => {
                    agg.stats.missing_timestamp += 1;
                    agg.warnings.bad_timestamps += 1;
                    continue;
                }
            }

            let Some(key) = key_fn(&record) else {
                agg.stats.invalid_key += 1;
                agg.warnings.invalid_keys += 1;
                continue;
            };

            let measure = measure_fn(&record);
            let duration = measure.duration.unwrap_or_else(|| {
                agg.warnings.bad_durations += 1;
                CallDuration::default()
            });
            let amount = measure.amount.unwrap_or_else(|| {
                agg.warnings.bad_amounts += 1;
                Decimal::ZERO
            });

            let bucket = agg
                .buckets
                .entry(key.clone())
                .or_insert_with(|| AggregateBucket::new(key));
            bucket.duration += duration;
            bucket.amount += amount;
            bucket.count += 1;
            agg.stats.aggregated += 1;
        }
    }

    pub fn finish(self) -> Aggregation {
        let agg = self.inner;
        log::debug!(
            "aggregated {} of {} record(s) into {} bucket(s)",
            agg.stats.aggregated,
            agg.stats.scanned,
            agg.buckets.len()
        );
        agg
    }
}

/// One-shot form of [`Aggregator`].
pub fn aggregate<R>(
    records: impl IntoIterator<Item = R>,
    key_fn: impl FnMut(&R) -> Option<CanonicalKey>,
    filter_fn: impl FnMut(&R) -> Verdict,
    measure_fn: impl FnMut(&R) -> Measure,
) -> Aggregation {
    let mut aggregator = Aggregator::new();
    aggregator.extend(records, key_fn, filter_fn, measure_fn);
    aggregator.finish()
}
