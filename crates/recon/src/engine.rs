use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::{aggregate, Aggregator, Measure};
use crate::config::{RunConfig, TimestampStyle};
use crate::error::ReconError;
use crate::fields::{resolve_columns, Field};
use crate::filter::{DateRange, RecordFilter};
use crate::model::RawTable;
use crate::normalize::{parse_amount, parse_duration, parse_fractional_duration, KeyRule, PlaceholderPolicy};
use crate::reconcile::{reconcile, regroup_by_label, ReconcileMode};
use crate::report::{customer_info_sheet, SheetSet, View};
use crate::roster::{build_roster, RosterColumns, RosterRules};
use crate::summary::RunSummary;

/// The three report flows the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Toll-free call durations billed per customer.
    TollFree,
    /// Per-ANI duration and amount totals over one or more call logs.
    AniSummary,
    /// Per-domain totals for the enabled numbers of a client list.
    DomainCompare,
}

impl Flow {
    pub fn artifact_prefix(self) -> &'static str {
        match self {
            Self::TollFree => "Toll_Free_Analysis",
            Self::AniSummary => "processed_data",
            Self::DomainCompare => "comparison_result",
        }
    }

    pub fn default_timestamp(self) -> TimestampStyle {
        match self {
            Self::TollFree => TimestampStyle::Date,
            Self::AniSummary | Self::DomainCompare => TimestampStyle::Iso,
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TollFree => write!(f, "toll-free"),
            Self::AniSummary => write!(f, "ani"),
            Self::DomainCompare => write!(f, "compare"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Keep only calls whose `call_time` falls inside this window. Makes the
    /// call-time column required.
    pub date_range: Option<DateRange>,
}

/// What the writer needs to name and describe the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub flow: Flow,
    pub artifact_prefix: String,
    pub timestamp: TimestampStyle,
    pub mode: ReconcileMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub engine_version: String,
}

impl ReportMeta {
    fn new(flow: Flow, config: &RunConfig, mode: ReconcileMode, date_range: Option<DateRange>) -> Self {
        Self {
            flow,
            artifact_prefix: flow.artifact_prefix().to_string(),
            timestamp: config.output.timestamp.unwrap_or(flow.default_timestamp()),
            mode,
            date_range,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// `_{start}_to_{end}` when a date filter was active, else empty.
    pub fn file_infix(&self) -> String {
        self.date_range.map(|r| r.file_infix()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub meta: ReportMeta,
    pub summary: RunSummary,
    pub sheets: SheetSet,
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Bill toll-free call time per customer.
///
/// Calls are keyed by the toll-free form of the destination number and must
/// carry the success response. The roster maps toll-free numbers to customer
/// names; `-` customers are dropped and non-toll-free numbers are ignored.
pub fn run_toll_free(calls: &RawTable, roster: &RawTable, config: &RunConfig) -> Result<RunOutput, ReconError> {
    require_rows(calls)?;
    require_rows(roster)?;

    let [destination, response, duration] = resolve_columns(
        &calls.name,
        &calls.headers,
        [Field::Destination, Field::Response, Field::Duration],
    )?;
    let [phone, customer] = resolve_columns(&roster.name, &roster.headers, [Field::Phone, Field::Customer])?;

    let key_rule = config.toll_free_rule();
    let filter = RecordFilter::new().with_response(response, config.success_response.as_str());

    let agg = aggregate(
        calls.records(),
        |r| key_rule.extract(r.get(destination)),
        |r| filter.accepts(r),
        |r| Measure {
            duration: parse_duration(r.get(duration)),
            amount: Some(Decimal::ZERO),
        },
    );

    let roster = build_roster(
        roster,
        RosterColumns {
            key: phone,
            label: customer,
            enable: None,
        },
        &RosterRules {
            key_rule,
            placeholder: PlaceholderPolicy::Exclude,
            require_label: false,
        },
    );

    let mode = config.reconcile.mode.unwrap_or_default();
    let recon = reconcile(&agg.buckets, &roster.entries, mode, &config.tariff);
    if recon.rows.is_empty() {
        return Err(ReconError::NoMatch(
            "no toll-free number in the call log matches the customer roster".into(),
        ));
    }
    let by_customer = regroup_by_label(&recon.rows);

    let mut summary = RunSummary {
        files_read: 2,
        ..RunSummary::default()
    };
    summary.record_aggregation(&agg.stats, agg.len());
    summary.record_roster(&roster.stats);
    summary.record_reconcile(&recon.stats);
    summary.warnings = agg.warnings;
    summary.output_rows = by_customer.len() as u64;

    let sheets = SheetSet {
        sheets: vec![
            customer_info_sheet(&roster.entries),
            View::DurationSummary.render(&recon.rows),
            View::BillingDetails.render(&by_customer),
        ],
        primary: 2,
    };

    finish(ReportMeta::new(Flow::TollFree, config, mode, None), summary, sheets)
}

/// Per-ANI totals over every supplied call log. Logs with no rows are
/// skipped; if all of them are empty the run fails.
pub fn run_ani_summary(calls: &[RawTable], options: &RunOptions, config: &RunConfig) -> Result<RunOutput, ReconError> {
    let mut aggregator = Aggregator::new();
    let mut summary = RunSummary {
        date_range: options.date_range,
        ..RunSummary::default()
    };

    for table in calls {
        if table.is_empty() {
            log::warn!("{}: no rows, skipped", table.name);
            summary.files_skipped_empty += 1;
            continue;
        }
        let cols = call_log_columns(table, options.date_range)?;
        extend_call_log(&mut aggregator, table, cols);
        summary.files_read += 1;
    }

    if summary.files_read == 0 {
        return Err(ReconError::empty(
            "call logs",
            "no valid data found in any of the input files",
        ));
    }

    let agg = aggregator.finish();
    // No reference side: every bucket is its own row, labelled by its ANI.
    let mode = ReconcileMode::AllPrimary;
    let recon = reconcile(&agg.buckets, &[], mode, &config.tariff);
    if recon.rows.is_empty() {
        return Err(ReconError::NoMatch(no_records_detail(options.date_range)));
    }

    summary.record_aggregation(&agg.stats, agg.len());
    summary.record_reconcile(&recon.stats);
    summary.warnings = agg.warnings;
    summary.output_rows = recon.rows.len() as u64;

    let sheets = SheetSet {
        sheets: vec![View::ProcessedData.render(&recon.rows)],
        primary: 0,
    };

    finish(
        ReportMeta::new(Flow::AniSummary, config, mode, options.date_range),
        summary,
        sheets,
    )
}

/// Join a client list's enabled numbers against a call log by ANI and total
/// the matches per domain.
pub fn run_domain_compare(
    roster: &RawTable,
    calls: &RawTable,
    options: &RunOptions,
    config: &RunConfig,
) -> Result<RunOutput, ReconError> {
    require_rows(roster)?;
    require_rows(calls)?;

    let [phone, domain, enable] = resolve_columns(
        &roster.name,
        &roster.headers,
        [Field::Phone, Field::Domain, Field::Enable],
    )?;
    let call_cols = call_log_columns(calls, options.date_range)?;

    let roster_table = roster;
    let roster = build_roster(
        roster_table,
        RosterColumns {
            key: phone,
            label: domain,
            enable: Some(enable),
        },
        &RosterRules {
            key_rule: KeyRule::Phone,
            placeholder: PlaceholderPolicy::Relabel,
            require_label: true,
        },
    );
    if roster.is_empty() {
        return Err(ReconError::empty(&roster_table.name, "no enabled phone numbers"));
    }

    let mut aggregator = Aggregator::new();
    extend_call_log(&mut aggregator, calls, call_cols);
    let agg = aggregator.finish();

    let mode = config.reconcile.mode.unwrap_or_default();
    let recon = reconcile(&agg.buckets, &roster.entries, mode, &config.tariff);
    let by_domain = regroup_by_label(&recon.rows);
    if by_domain.is_empty() {
        return Err(ReconError::NoMatch(
            "no matching phone numbers between the client list and the call log".into(),
        ));
    }

    let mut summary = RunSummary {
        files_read: 2,
        date_range: options.date_range,
        ..RunSummary::default()
    };
    summary.record_aggregation(&agg.stats, agg.len());
    summary.record_roster(&roster.stats);
    summary.record_reconcile(&recon.stats);
    summary.warnings = agg.warnings;
    summary.output_rows = by_domain.len() as u64;

    let sheets = SheetSet {
        sheets: vec![View::ComparisonResult.render(&by_domain)],
        primary: 0,
    };

    finish(
        ReportMeta::new(Flow::DomainCompare, config, mode, options.date_range),
        summary,
        sheets,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_rows(table: &RawTable) -> Result<(), ReconError> {
    if table.is_empty() {
        return Err(ReconError::empty(&table.name, "file contains no rows"));
    }
    Ok(())
}

/// Column indexes of an ANI call log.
#[derive(Debug, Clone, Copy)]
struct CallLogColumns {
    ani: usize,
    duration: usize,
    amount: usize,
    /// `call_time` column and the window it must fall in.
    date_filter: Option<(usize, DateRange)>,
}

/// `ani`, `duration`, `total_amount`; `call_time` too when filtering by date.
fn call_log_columns(table: &RawTable, date_range: Option<DateRange>) -> Result<CallLogColumns, ReconError> {
    let (name, headers) = (&table.name, &table.headers);
    match date_range {
        Some(range) => {
            let [ani, duration, amount, call_time] = resolve_columns(
                name,
                headers,
                [Field::Ani, Field::Duration, Field::TotalAmount, Field::CallTime],
            )?;
            Ok(CallLogColumns { ani, duration, amount, date_filter: Some((call_time, range)) })
        }
        None => {
            let [ani, duration, amount] =
                resolve_columns(name, headers, [Field::Ani, Field::Duration, Field::TotalAmount])?;
            Ok(CallLogColumns { ani, duration, amount, date_filter: None })
        }
    }
}

fn extend_call_log(aggregator: &mut Aggregator, table: &RawTable, cols: CallLogColumns) {
    let mut filter = RecordFilter::new();
    if let Some((call_time, range)) = cols.date_filter {
        filter = filter.with_date_range(call_time, range);
    }

    aggregator.extend(
        table.records(),
        |r| KeyRule::Phone.extract(r.get(cols.ani)),
        |r| filter.accepts(r),
        |r| Measure {
            duration: parse_fractional_duration(r.get(cols.duration)),
            amount: parse_amount(r.get(cols.amount)),
        },
    );
}

fn no_records_detail(date_range: Option<DateRange>) -> String {
    match date_range {
        Some(range) => format!("no records within date range {range}"),
        None => "no record carries a valid ANI".into(),
    }
}

fn finish(meta: ReportMeta, summary: RunSummary, sheets: SheetSet) -> Result<RunOutput, ReconError> {
    if summary.warnings.total() > 0 {
        let w = &summary.warnings;
        log::warn!(
            "{}: normalization warnings: {} bad duration(s), {} bad amount(s), {} bad timestamp(s), {} invalid key(s)",
            meta.flow,
            w.bad_durations,
            w.bad_amounts,
            w.bad_timestamps,
            w.invalid_keys
        );
    }
    log::info!(
        "{}: {} row(s) from {} record(s) ({} aggregated, {} skipped)",
        meta.flow,
        summary.output_rows,
        summary.records_scanned,
        summary.records_aggregated,
        summary.records_skipped()
    );

    Ok(RunOutput { meta, summary, sheets })
}
