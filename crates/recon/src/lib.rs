//! `callbill-recon`: call-detail aggregation and roster reconciliation.
//!
//! Pure engine crate: receives pre-loaded tables, returns a sheet set plus a
//! run summary. No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod roster;
pub mod summary;

pub use config::{RunConfig, Tariff, TimestampStyle};
pub use engine::{run_ani_summary, run_domain_compare, run_toll_free, Flow, ReportMeta, RunOptions, RunOutput};
pub use error::ReconError;
pub use filter::DateRange;
pub use model::{RawTable, RawValue};
pub use reconcile::ReconcileMode;
pub use report::{CellValue, Sheet, SheetSet};
pub use summary::RunSummary;
